// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-challenge progress projection.

use chrono::{DateTime, Utc};

use crate::models::{Challenge, ChallengeStats, ChallengeStatus, Completion};
use crate::services::calendar::total_days;
use crate::time_utils::start_of_day_utc;

/// Project progress numbers for a challenge as of `now`.
///
/// Active challenges count every completion against the days elapsed so
/// far. Completed challenges only count completions whose day starts
/// inside `[created_at, completed_at]`, so anything logged after the
/// challenge ended is ignored.
pub fn project(challenge: &Challenge, completions: &[Completion], now: DateTime<Utc>) -> ChallengeStats {
    match challenge.status() {
        ChallengeStatus::Active => {
            let total = total_days(challenge.created_at, now);
            let completed = completions.len() as i64;

            ChallengeStats {
                total_days: total,
                completed_days: completed,
                missed_days: (total - completed).max(0),
                completion_rate: None,
                started_at: None,
                ended_at: None,
            }
        }
        ChallengeStatus::Completed(completed_at) => {
            let total = total_days(challenge.created_at, completed_at);
            let completed = completions
                .iter()
                .map(|c| start_of_day_utc(c.date))
                .filter(|day| *day >= challenge.created_at && *day <= completed_at)
                .count() as i64;

            ChallengeStats {
                total_days: total,
                completed_days: completed,
                missed_days: (total - completed).max(0),
                completion_rate: Some(completion_rate(completed, total)),
                started_at: Some(challenge.created_at),
                ended_at: Some(completed_at),
            }
        }
    }
}

/// Rounded percentage of `completed` over `total`; 0 when `total` is not positive.
pub fn completion_rate(completed: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as u32
}
