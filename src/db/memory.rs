// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local storage backend.
//!
//! Mirrors the Firestore collections with concurrent maps. Used by tests
//! and for running the API without a Firestore project.

use crate::error::AppError;
use crate::models::{Challenge, Completion, User};
use crate::services::streak::{reset_streaks, StreakChange};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Collections {
    users: DashMap<String, User>,
    challenges: DashMap<String, Challenge>,
    completions: DashMap<String, Completion>,
    unavailable: AtomicBool,
}

/// In-memory store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a database error, as an
    /// unreachable Firestore would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<&Collections, AppError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database("Memory store unavailable".to_string()));
        }
        Ok(&self.inner)
    }

    // ─── Users ───────────────────────────────────────────────────

    pub fn get_user(&self, external_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .check_available()?
            .users
            .get(external_id)
            .map(|entry| entry.value().clone()))
    }

    pub fn insert_user(&self, user: &User) -> Result<bool, AppError> {
        match self.check_available()?.users.entry(user.external_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(true)
            }
        }
    }

    // ─── Challenges ──────────────────────────────────────────────

    pub fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, AppError> {
        Ok(self
            .check_available()?
            .challenges
            .get(challenge_id)
            .map(|entry| entry.value().clone()))
    }

    pub fn set_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        self.check_available()?
            .challenges
            .insert(challenge.id.clone(), challenge.clone());
        Ok(())
    }

    /// Apply a streak change while holding the challenge's entry, so
    /// concurrent updates to the same challenge run one at a time.
    pub fn update_streaks(
        &self,
        challenge_id: &str,
        user_id: &str,
        change: StreakChange,
    ) -> Result<Option<Challenge>, AppError> {
        let store = self.check_available()?;
        let Some(mut entry) = store.challenges.get_mut(challenge_id) else {
            return Ok(None);
        };

        let challenge = entry.value_mut();
        if !change.apply_incremental(challenge) {
            let dates: Vec<_> = self
                .get_completions_for_challenge(challenge_id, user_id)?
                .into_iter()
                .map(|c| c.date)
                .collect();
            reset_streaks(challenge, &dates);
        }
        Ok(Some(challenge.clone()))
    }

    pub fn complete_challenge(
        &self,
        challenge_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Challenge>, AppError> {
        let store = self.check_available()?;
        let Some(mut entry) = store.challenges.get_mut(challenge_id) else {
            return Ok(None);
        };

        entry.value_mut().complete(now)?;
        Ok(Some(entry.value().clone()))
    }

    pub fn get_challenges_for_user(&self, user_id: &str) -> Result<Vec<Challenge>, AppError> {
        let mut challenges: Vec<Challenge> = self
            .check_available()?
            .challenges
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(challenges)
    }

    pub fn delete_challenge_cascade(&self, challenge_id: &str) -> Result<usize, AppError> {
        let store = self.check_available()?;
        let mut removed = 0;
        store.completions.retain(|_, completion| {
            let keep = completion.challenge_id != challenge_id;
            if !keep {
                removed += 1;
            }
            keep
        });
        store.challenges.remove(challenge_id);
        Ok(removed)
    }

    // ─── Completions ─────────────────────────────────────────────

    pub fn get_completion(&self, completion_id: &str) -> Result<Option<Completion>, AppError> {
        Ok(self
            .check_available()?
            .completions
            .get(completion_id)
            .map(|entry| entry.value().clone()))
    }

    pub fn insert_completion(&self, completion: &Completion) -> Result<bool, AppError> {
        match self
            .check_available()?
            .completions
            .entry(completion.id.clone())
        {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(completion.clone());
                Ok(true)
            }
        }
    }

    pub fn delete_completion(&self, completion_id: &str) -> Result<(), AppError> {
        self.check_available()?.completions.remove(completion_id);
        Ok(())
    }

    pub fn get_completions_for_challenge(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<Vec<Completion>, AppError> {
        let mut completions: Vec<Completion> = self
            .check_available()?
            .completions
            .iter()
            .filter(|c| c.challenge_id == challenge_id && c.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        completions.sort_by_key(|c| c.date);
        Ok(completions)
    }

    pub fn get_completions_for_user(&self, user_id: &str) -> Result<Vec<Completion>, AppError> {
        let mut completions: Vec<Completion> = self
            .check_available()?
            .completions
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        completions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(completions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn completion(challenge_id: &str, day: u32) -> Completion {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        Completion::new(challenge_id, "u1", date, None, Utc::now())
    }

    #[test]
    fn test_insert_completion_is_create_if_absent() {
        let store = MemoryStore::new();
        let first = completion("c1", 1);
        let mut second = first.clone();
        second.note = Some("again".to_string());

        assert!(store.insert_completion(&first).unwrap());
        assert!(!store.insert_completion(&second).unwrap());

        let stored = store.get_completion(&first.id).unwrap().unwrap();
        assert_eq!(stored.note, None);
    }

    #[test]
    fn test_cascade_only_touches_one_challenge() {
        let store = MemoryStore::new();
        for day in 1..=3 {
            store.insert_completion(&completion("c1", day)).unwrap();
        }
        store.insert_completion(&completion("c2", 1)).unwrap();

        assert_eq!(store.delete_challenge_cascade("c1").unwrap(), 3);
        assert_eq!(store.get_completions_for_user("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_unavailable_store_errors() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.get_completions_for_user("u1"),
            Err(AppError::Database(_))
        ));
        store.set_unavailable(false);
        assert!(store.get_completions_for_user("u1").unwrap().is_empty());
    }
}
