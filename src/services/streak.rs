// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consecutive-day streak computation.

use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Challenge;
use crate::services::calendar::day_diff;

/// Current and longest run of consecutive completion days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Streaks {
    /// Run ending at the most recent completion (not necessarily today)
    pub current: u32,
    pub longest: u32,
}

impl Streaks {
    /// Extend streaks with a completion that comes after `last`.
    ///
    /// Returns `None` when `new_date` is not strictly after `last`; the
    /// caller must recompute from the full history in that case.
    pub fn extend(self, last: Option<NaiveDate>, new_date: NaiveDate) -> Option<Streaks> {
        let current = match last {
            None => 1,
            Some(last) => match day_diff(last, new_date) {
                1 => self.current + 1,
                d if d > 1 => 1,
                _ => return None,
            },
        };

        Some(Streaks {
            current,
            longest: self.longest.max(current),
        })
    }

    /// Whether the run is still going: the last completion is today or yesterday.
    pub fn is_alive(last: Option<NaiveDate>, today: NaiveDate) -> bool {
        last.is_some_and(|last| (0..=1).contains(&day_diff(last, today)))
    }
}

/// Compute streaks from the full history of completion dates.
///
/// `dates` must be sorted ascending. Duplicates are treated as a break,
/// which cannot happen for a single challenge since the ledger stores at
/// most one completion per day.
pub fn compute_streaks(dates: &[NaiveDate]) -> Streaks {
    if dates.is_empty() {
        return Streaks::default();
    }

    let mut current = 1;
    let mut longest = 1;

    for pair in dates.windows(2) {
        if day_diff(pair[0], pair[1]) == 1 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 1;
        }
    }

    Streaks { current, longest }
}

/// A change to a challenge's completion history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    Marked(NaiveDate),
    Unmarked,
}

impl StreakChange {
    /// Fold the change into the challenge's stored streak fields without
    /// looking at history.
    ///
    /// Returns `false` when that is not possible (an unmark, or a mark that
    /// is not after the last completion); call [`reset_streaks`] with the
    /// full history instead.
    pub fn apply_incremental(self, challenge: &mut Challenge) -> bool {
        let StreakChange::Marked(date) = self else {
            return false;
        };

        let stored = Streaks {
            current: challenge.current_streak,
            longest: challenge.longest_streak,
        };
        match stored.extend(challenge.last_completed_date, date) {
            Some(streaks) => {
                challenge.current_streak = streaks.current;
                challenge.longest_streak = streaks.longest;
                challenge.last_completed_date = Some(date);
                true
            }
            None => false,
        }
    }
}

/// Overwrite the challenge's streak fields from its full, ascending history.
pub fn reset_streaks(challenge: &mut Challenge, dates: &[NaiveDate]) {
    let streaks = compute_streaks(dates);
    challenge.current_streak = streaks.current;
    challenge.longest_streak = streaks.longest;
    challenge.last_completed_date = dates.last().copied();
}
