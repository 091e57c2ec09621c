// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge lifecycle and dashboard read models.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use crate::db::{new_document_id, Db};
use crate::error::{AppError, Result};
use crate::models::{Category, Challenge, ChallengeStats, Completion};
use crate::services::heatmap::{build_grid, Heatmap};
use crate::services::ledger::CompletionLedger;
use crate::services::stats::project;
use crate::services::streak::Streaks;

const MAX_CONCURRENT_DB_OPS: usize = 16;

/// Fields supplied by the user when creating a challenge.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewChallenge {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub goal: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

fn validate_hex_color(color: &str) -> std::result::Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}

/// Active challenge with its completion days and progress.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActiveChallengeView {
    #[serde(flatten)]
    pub challenge: Challenge,
    /// Marked days, oldest first
    pub completions: Vec<NaiveDate>,
    #[serde(flatten)]
    pub stats: ChallengeStats,
    /// Last completion was today or yesterday
    pub streak_alive: bool,
}

/// Completed challenge with its final numbers.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletedChallengeView {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub stats: ChallengeStats,
}

#[derive(Clone)]
pub struct ChallengeService {
    db: Db,
    ledger: CompletionLedger,
}

impl ChallengeService {
    pub fn new(db: Db) -> Self {
        Self {
            ledger: CompletionLedger::new(db.clone()),
            db,
        }
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    /// Create a challenge for an existing user.
    pub async fn create_challenge(&self, user_id: &str, new: NewChallenge) -> Result<Challenge> {
        new.validate()?;

        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let now = Utc::now();
        if new.deadline.is_some_and(|deadline| deadline <= now) {
            return Err(AppError::BadRequest(
                "Deadline must be in the future".to_string(),
            ));
        }

        let challenge = Challenge {
            id: new_document_id()?,
            user_id: user_id.to_string(),
            name: new.name.trim().to_string(),
            goal: new.goal.trim().to_string(),
            description: new.description.filter(|d| !d.trim().is_empty()),
            category: new.category,
            color: new.color.to_ascii_lowercase(),
            created_at: now,
            active: true,
            completed_at: None,
            deadline: new.deadline,
            current_streak: 0,
            longest_streak: 0,
            last_completed_date: None,
        };

        self.db.set_challenge(&challenge).await?;
        tracing::info!(
            challenge_id = %challenge.id,
            user_id,
            category = ?challenge.category,
            "Challenge created"
        );

        Ok(challenge)
    }

    /// Mark an active challenge as finished.
    pub async fn complete_challenge(&self, challenge_id: &str, user_id: &str) -> Result<Challenge> {
        self.ledger.owned_challenge(challenge_id, user_id).await?;
        let challenge = self
            .db
            .complete_challenge(challenge_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::challenge_not_found(challenge_id))?;

        tracing::info!(challenge_id, user_id, "Challenge completed");
        Ok(challenge)
    }

    /// Delete an active challenge together with its completions.
    pub async fn delete_challenge(&self, challenge_id: &str, user_id: &str) -> Result<usize> {
        let challenge = self.ledger.owned_challenge(challenge_id, user_id).await?;
        if !challenge.is_active() {
            return Err(AppError::BadRequest(format!(
                "Challenge {} is completed; delete it from history instead",
                challenge_id
            )));
        }
        self.delete_cascade(challenge_id, user_id).await
    }

    /// Delete a completed challenge together with its completions.
    pub async fn delete_completed_challenge(&self, challenge_id: &str, user_id: &str) -> Result<usize> {
        let challenge = self.ledger.owned_challenge(challenge_id, user_id).await?;
        if challenge.is_active() {
            return Err(AppError::BadRequest(format!(
                "Challenge {} is still active",
                challenge_id
            )));
        }
        self.delete_cascade(challenge_id, user_id).await
    }

    async fn delete_cascade(&self, challenge_id: &str, user_id: &str) -> Result<usize> {
        let removed = self.db.delete_challenge_cascade(challenge_id).await?;
        tracing::info!(challenge_id, user_id, completions_removed = removed, "Challenge deleted");
        Ok(removed)
    }

    /// Active challenges with progress as of `now`, newest first.
    ///
    /// A failed completions fetch fails the whole listing; an empty
    /// completions list always means "nothing marked yet".
    pub async fn active_challenges(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveChallengeView>> {
        let challenges: Vec<Challenge> = self
            .db
            .get_challenges_for_user(user_id)
            .await?
            .into_iter()
            .filter(Challenge::is_active)
            .collect();

        let with_completions = self.attach_completions(challenges, user_id).await?;
        let today = now.date_naive();

        Ok(with_completions
            .into_iter()
            .map(|(challenge, completions)| {
                let stats = project(&challenge, &completions, now);
                let streak_alive = Streaks::is_alive(challenge.last_completed_date, today);
                ActiveChallengeView {
                    completions: completions.iter().map(|c| c.date).collect(),
                    stats,
                    streak_alive,
                    challenge,
                }
            })
            .collect())
    }

    /// Completed challenges with final stats, newest first.
    pub async fn completed_challenges(&self, user_id: &str) -> Result<Vec<CompletedChallengeView>> {
        let challenges: Vec<Challenge> = self
            .db
            .get_challenges_for_user(user_id)
            .await?
            .into_iter()
            .filter(|c| !c.is_active())
            .collect();

        let with_completions = self.attach_completions(challenges, user_id).await?;
        let now = Utc::now();

        Ok(with_completions
            .into_iter()
            .map(|(challenge, completions)| CompletedChallengeView {
                stats: project(&challenge, &completions, now),
                challenge,
            })
            .collect())
    }

    /// Heatmap of the trailing year for one challenge.
    pub async fn heatmap(
        &self,
        challenge_id: &str,
        user_id: &str,
        today: NaiveDate,
        week_start: Weekday,
    ) -> Result<Heatmap> {
        let challenge = self.ledger.owned_challenge(challenge_id, user_id).await?;
        let completed: HashSet<NaiveDate> = self
            .db
            .get_completions_for_challenge(challenge_id, user_id)
            .await?
            .into_iter()
            .map(|c| c.date)
            .collect();

        Ok(build_grid(&completed, challenge.created_at, today, week_start))
    }

    /// Fetch completions for each challenge with bounded concurrency,
    /// preserving input order.
    async fn attach_completions(
        &self,
        challenges: Vec<Challenge>,
        user_id: &str,
    ) -> Result<Vec<(Challenge, Vec<Completion>)>> {
        stream::iter(challenges)
            .map(|challenge| async move {
                match self
                    .db
                    .get_completions_for_challenge(&challenge.id, user_id)
                    .await
                {
                    Ok(completions) => Ok((challenge, completions)),
                    Err(e) => {
                        tracing::error!(
                            challenge_id = %challenge.id,
                            user_id,
                            error = %e,
                            "Failed to fetch completions"
                        );
                        Err(e)
                    }
                }
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .try_collect()
            .await
    }
}
