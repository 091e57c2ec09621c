// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Week-aligned heatmap over the trailing year.
//!
//! The grid is a list of weeks (columns in the UI), each holding exactly
//! seven day cells. The first and last weeks are padded with days outside
//! the window so that every column starts on the configured weekday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::Serialize;
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::services::stats::completion_rate;

/// Number of days shown, ending today inclusive.
pub const WINDOW_DAYS: i64 = 365;

const DAYS_PER_WEEK: usize = 7;

/// Display state of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// A completion exists for this day
    Done,
    /// On or after the creation day, before today, with no completion
    Missed,
    /// Today, not yet completed
    Today,
    /// Inside the window but before the challenge existed
    Pending,
    /// Alignment filler outside the window
    Padding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub state: CellState,
    /// False for padding cells
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Heatmap {
    pub weeks: Vec<Vec<HeatmapCell>>,
    /// Completions that fall inside the window
    pub completed_in_window: u32,
    /// `completed_in_window` as a rounded percentage of the window
    pub window_completion_rate: u32,
}

/// Build the heatmap for a challenge.
pub fn build_grid(
    completions: &HashSet<NaiveDate>,
    challenge_created_at: DateTime<Utc>,
    today: NaiveDate,
    week_start: Weekday,
) -> Heatmap {
    let window_start = today - Duration::days(WINDOW_DAYS - 1);
    let created_day = challenge_created_at.date_naive();

    let lead = (window_start.weekday().num_days_from_monday() as i64
        - week_start.num_days_from_monday() as i64)
        .rem_euclid(DAYS_PER_WEEK as i64);
    let grid_start = window_start - Duration::days(lead);

    let cell_count = (lead + WINDOW_DAYS) as usize;
    let week_count = cell_count.div_ceil(DAYS_PER_WEEK);

    let mut completed_in_window = 0u32;
    let mut weeks = Vec::with_capacity(week_count);

    for week in 0..week_count {
        let mut cells = Vec::with_capacity(DAYS_PER_WEEK);
        for offset in 0..DAYS_PER_WEEK {
            let date = grid_start + Duration::days((week * DAYS_PER_WEEK + offset) as i64);

            let state = if date < window_start || date > today {
                CellState::Padding
            } else if completions.contains(&date) {
                completed_in_window += 1;
                CellState::Done
            } else if date == today {
                CellState::Today
            } else if date >= created_day {
                CellState::Missed
            } else {
                CellState::Pending
            };

            cells.push(HeatmapCell {
                date,
                state,
                interactive: state != CellState::Padding,
            });
        }
        weeks.push(cells);
    }

    Heatmap {
        weeks,
        completed_in_window,
        window_completion_rate: completion_rate(completed_in_window as i64, WINDOW_DAYS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn in_window(grid: &Heatmap) -> Vec<&HeatmapCell> {
        grid.weeks
            .iter()
            .flatten()
            .filter(|c| c.state != CellState::Padding)
            .collect()
    }

    #[test]
    fn test_every_week_has_seven_cells_for_any_weekday() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let base = d("2024-06-03");

        for shift in 0..7 {
            let today = base + Duration::days(shift);
            for week_start in [Weekday::Sun, Weekday::Mon, Weekday::Tue, Weekday::Sat] {
                let grid = build_grid(&HashSet::new(), created, today, week_start);

                assert!(grid.weeks.iter().all(|w| w.len() == 7));
                assert_eq!(grid.weeks[0][0].date.weekday(), week_start);
                assert_eq!(in_window(&grid).len(), WINDOW_DAYS as usize);

                let last = in_window(&grid).last().map(|c| c.date);
                assert_eq!(last, Some(today));
            }
        }
    }

    #[test]
    fn test_padding_is_not_interactive() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let grid = build_grid(&HashSet::new(), created, d("2024-06-05"), Weekday::Tue);

        for cell in grid.weeks.iter().flatten() {
            assert_eq!(cell.interactive, cell.state != CellState::Padding);
        }
        let padding = grid
            .weeks
            .iter()
            .flatten()
            .filter(|c| c.state == CellState::Padding)
            .count();
        assert_eq!(padding, grid.weeks.len() * 7 - WINDOW_DAYS as usize);
    }

    #[test]
    fn test_cell_classification() {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap();
        let today = d("2024-06-05");
        let completions: HashSet<NaiveDate> =
            [d("2024-06-02"), d("2024-06-04"), d("2023-01-01")].into();

        let grid = build_grid(&completions, created, today, Weekday::Tue);
        let state_of = |date: NaiveDate| {
            grid.weeks
                .iter()
                .flatten()
                .find(|c| c.date == date)
                .map(|c| c.state)
        };

        assert_eq!(state_of(d("2024-05-31")), Some(CellState::Pending));
        assert_eq!(state_of(d("2024-06-01")), Some(CellState::Missed));
        assert_eq!(state_of(d("2024-06-02")), Some(CellState::Done));
        assert_eq!(state_of(d("2024-06-03")), Some(CellState::Missed));
        assert_eq!(state_of(d("2024-06-04")), Some(CellState::Done));
        assert_eq!(state_of(d("2024-06-05")), Some(CellState::Today));

        // 2023-01-01 is outside the window and not counted
        assert_eq!(grid.completed_in_window, 2);
        assert_eq!(grid.window_completion_rate, 1);
    }

    #[test]
    fn test_completed_today_is_done() {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let today = d("2024-06-05");
        let grid = build_grid(&[today].into(), created, today, Weekday::Mon);

        let cell = in_window(&grid).last().copied().cloned().unwrap();
        assert_eq!(cell.date, today);
        assert_eq!(cell.state, CellState::Done);
    }

    #[test]
    fn test_cell_states_serialize_snake_case() {
        assert_eq!(serde_json::to_value(CellState::Pending).unwrap(), "pending");
        assert_eq!(serde_json::to_value(CellState::Missed).unwrap(), "missed");
    }
}
