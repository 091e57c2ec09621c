// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod challenge;
pub mod completion;
pub mod stats;
pub mod user;

pub use challenge::{Category, Challenge, ChallengeStatus};
pub use completion::Completion;
pub use stats::ChallengeStats;
pub use user::User;
