// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Challenge model and lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};

/// Challenge category shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Category {
    Health,
    Fitness,
    Learning,
    Productivity,
    Wellness,
    Creativity,
    Social,
    Career,
    Finance,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Health,
        Category::Fitness,
        Category::Learning,
        Category::Productivity,
        Category::Wellness,
        Category::Creativity,
        Category::Social,
        Category::Career,
        Category::Finance,
        Category::Other,
    ];
}

/// Lifecycle state derived from the stored `active`/`completed_at` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Active,
    Completed(DateTime<Utc>),
}

/// Stored challenge document in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Challenge {
    /// Random hex ID (also used as document ID)
    pub id: String,
    /// Owner's external ID
    pub user_id: String,
    pub name: String,
    pub goal: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    /// Display color (`#rrggbb`)
    pub color: String,
    pub created_at: DateTime<Utc>,
    /// False once the challenge has been completed
    pub active: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    // ─── Denormalized streak state (written by the completion ledger) ───
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// Latest completion date, used for incremental streak updates
    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,
}

impl Challenge {
    /// Current lifecycle state.
    ///
    /// A document with `active == false` but no `completed_at` should not
    /// exist; it is reported as completed at its creation time so that
    /// stats never count a negative range.
    pub fn status(&self) -> ChallengeStatus {
        match (self.active, self.completed_at) {
            (true, _) => ChallengeStatus::Active,
            (false, Some(at)) => ChallengeStatus::Completed(at),
            (false, None) => ChallengeStatus::Completed(self.created_at),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status(), ChallengeStatus::Active)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Transition `Active -> Completed`.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_active() {
            return Err(AppError::ChallengeNotActive(self.id.clone()));
        }
        self.active = false;
        self.completed_at = Some(now);
        Ok(())
    }
}
