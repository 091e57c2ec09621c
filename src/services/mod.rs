// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod challenges;
pub mod heatmap;
pub mod ledger;
pub mod stats;
pub mod streak;
pub mod users;

pub use challenges::{ActiveChallengeView, ChallengeService, CompletedChallengeView, NewChallenge};
pub use heatmap::{Heatmap, HeatmapCell};
pub use ledger::{CompletionLedger, MarkResult};
pub use streak::Streaks;
pub use users::UserService;
