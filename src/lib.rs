// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Challenge Tracker: daily habit challenges with streaks and heatmaps
//!
//! This crate provides the backend API for creating challenges, marking
//! days done, and computing progress statistics.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{ChallengeService, UserService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: UserService,
    pub challenges: ChallengeService,
}

impl AppState {
    pub fn new(config: Config, db: Db) -> Self {
        Self {
            users: UserService::new(db.clone()),
            challenges: ChallengeService::new(db),
            config,
        }
    }
}
