// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completion ledger.
//!
//! Marking and unmarking days is idempotent: a second mark for the same
//! (challenge, user, date) returns the existing record, a second unmark
//! is a no-op. Both keep the challenge's streak fields current.

use chrono::{NaiveDate, Utc};

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{Challenge, Completion};
use crate::services::streak::StreakChange;

/// Outcome of [`CompletionLedger::mark_done`].
#[derive(Debug, Clone)]
pub struct MarkResult {
    pub completion: Completion,
    /// False when the day was already marked
    pub created: bool,
}

#[derive(Clone)]
pub struct CompletionLedger {
    db: Db,
}

impl CompletionLedger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Load a challenge, treating someone else's challenge as missing.
    pub(crate) async fn owned_challenge(&self, challenge_id: &str, user_id: &str) -> Result<Challenge> {
        match self.db.get_challenge(challenge_id).await? {
            Some(challenge) if challenge.is_owned_by(user_id) => Ok(challenge),
            Some(_) => {
                tracing::warn!(challenge_id, user_id, "Access to foreign challenge denied");
                Err(AppError::challenge_not_found(challenge_id))
            }
            None => Err(AppError::challenge_not_found(challenge_id)),
        }
    }

    /// Record a completion for `date`.
    pub async fn mark_done(
        &self,
        challenge_id: &str,
        user_id: &str,
        date: NaiveDate,
        note: Option<String>,
    ) -> Result<MarkResult> {
        self.owned_challenge(challenge_id, user_id).await?;

        let completion = Completion::new(challenge_id, user_id, date, note, Utc::now());

        if !self.db.insert_completion(&completion).await? {
            let existing = self
                .db
                .get_completion(&completion.id)
                .await?
                .ok_or_else(|| {
                    AppError::Database(format!(
                        "Completion {} removed while marking",
                        completion.id
                    ))
                })?;

            tracing::debug!(challenge_id, %date, "Day already marked (idempotent skip)");
            return Ok(MarkResult {
                completion: existing,
                created: false,
            });
        }

        let challenge = self
            .update_streaks(challenge_id, user_id, StreakChange::Marked(date))
            .await?;

        tracing::info!(
            challenge_id,
            %date,
            current_streak = challenge.current_streak,
            longest_streak = challenge.longest_streak,
            "Day marked done"
        );

        Ok(MarkResult {
            completion,
            created: true,
        })
    }

    /// Remove the completion for `date`.
    ///
    /// Returns the deleted record's ID, or `None` if the day was not marked.
    pub async fn unmark_done(
        &self,
        challenge_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<String>> {
        self.owned_challenge(challenge_id, user_id).await?;

        let completion_id = Completion::natural_key_id(challenge_id, user_id, date);
        if self.db.get_completion(&completion_id).await?.is_none() {
            tracing::debug!(challenge_id, %date, "Day not marked (idempotent skip)");
            return Ok(None);
        }

        self.db.delete_completion(&completion_id).await?;

        self.update_streaks(challenge_id, user_id, StreakChange::Unmarked)
            .await?;

        tracing::info!(challenge_id, %date, "Day unmarked");
        Ok(Some(completion_id))
    }

    /// Completions for a challenge, oldest first.
    pub async fn list_by_challenge(&self, challenge_id: &str, user_id: &str) -> Result<Vec<Completion>> {
        self.owned_challenge(challenge_id, user_id).await?;
        self.db.get_completions_for_challenge(challenge_id, user_id).await
    }

    /// Every completion for a user, most recent first.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Completion>> {
        self.db.get_completions_for_user(user_id).await
    }

    async fn update_streaks(
        &self,
        challenge_id: &str,
        user_id: &str,
        change: StreakChange,
    ) -> Result<Challenge> {
        self.db
            .update_streaks(challenge_id, user_id, change)
            .await?
            .ok_or_else(|| AppError::challenge_not_found(challenge_id))
    }
}
