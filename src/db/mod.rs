//! Database layer (Firestore, with an in-memory stand-in).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Challenge, Completion, User};
use crate::services::streak::StreakChange;
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};

/// Collection names as constants.
pub mod collections {
    /// Keyed by external (identity provider) ID
    pub const USERS: &str = "users";
    pub const CHALLENGES: &str = "challenges";
    /// Keyed by the hashed (challenge, user, date) natural key
    pub const COMPLETIONS: &str = "completions";
}

/// Random 128-bit document ID, hex encoded.
pub fn new_document_id() -> Result<String, AppError> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;
    Ok(hex::encode(bytes))
}

/// Storage handle shared by all services.
#[derive(Clone)]
pub enum Db {
    Firestore(FirestoreDb),
    Memory(MemoryStore),
}

impl Db {
    pub fn memory() -> Self {
        Db::Memory(MemoryStore::new())
    }

    pub async fn get_user(&self, external_id: &str) -> Result<Option<User>, AppError> {
        match self {
            Db::Firestore(db) => db.get_user(external_id).await,
            Db::Memory(store) => store.get_user(external_id),
        }
    }

    /// Returns `false` if a user with the same external ID already existed.
    pub async fn insert_user(&self, user: &User) -> Result<bool, AppError> {
        match self {
            Db::Firestore(db) => db.insert_user(user).await,
            Db::Memory(store) => store.insert_user(user),
        }
    }

    pub async fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, AppError> {
        match self {
            Db::Firestore(db) => db.get_challenge(challenge_id).await,
            Db::Memory(store) => store.get_challenge(challenge_id),
        }
    }

    pub async fn set_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.set_challenge(challenge).await,
            Db::Memory(store) => store.set_challenge(challenge),
        }
    }

    /// Fold a mark or unmark into the challenge's streak fields atomically
    /// with respect to other updates of the same challenge.
    ///
    /// Returns `None` if the challenge no longer exists.
    pub async fn update_streaks(
        &self,
        challenge_id: &str,
        user_id: &str,
        change: StreakChange,
    ) -> Result<Option<Challenge>, AppError> {
        match self {
            Db::Firestore(db) => db.update_streaks(challenge_id, user_id, change).await,
            Db::Memory(store) => store.update_streaks(challenge_id, user_id, change),
        }
    }

    /// Atomic `Active -> Completed` transition.
    pub async fn complete_challenge(
        &self,
        challenge_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Challenge>, AppError> {
        match self {
            Db::Firestore(db) => db.complete_challenge(challenge_id, now).await,
            Db::Memory(store) => store.complete_challenge(challenge_id, now),
        }
    }

    /// Newest first.
    pub async fn get_challenges_for_user(&self, user_id: &str) -> Result<Vec<Challenge>, AppError> {
        match self {
            Db::Firestore(db) => db.get_challenges_for_user(user_id).await,
            Db::Memory(store) => store.get_challenges_for_user(user_id),
        }
    }

    pub async fn delete_challenge_cascade(&self, challenge_id: &str) -> Result<usize, AppError> {
        match self {
            Db::Firestore(db) => db.delete_challenge_cascade(challenge_id).await,
            Db::Memory(store) => store.delete_challenge_cascade(challenge_id),
        }
    }

    pub async fn get_completion(&self, completion_id: &str) -> Result<Option<Completion>, AppError> {
        match self {
            Db::Firestore(db) => db.get_completion(completion_id).await,
            Db::Memory(store) => store.get_completion(completion_id),
        }
    }

    /// Create-if-absent. Returns `false` when the natural key was already taken.
    pub async fn insert_completion(&self, completion: &Completion) -> Result<bool, AppError> {
        match self {
            Db::Firestore(db) => db.insert_completion(completion).await,
            Db::Memory(store) => store.insert_completion(completion),
        }
    }

    pub async fn delete_completion(&self, completion_id: &str) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.delete_completion(completion_id).await,
            Db::Memory(store) => store.delete_completion(completion_id),
        }
    }

    /// Oldest first.
    pub async fn get_completions_for_challenge(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<Vec<Completion>, AppError> {
        match self {
            Db::Firestore(db) => db.get_completions_for_challenge(challenge_id, user_id).await,
            Db::Memory(store) => store.get_completions_for_challenge(challenge_id, user_id),
        }
    }

    /// Most recent day first.
    pub async fn get_completions_for_user(&self, user_id: &str) -> Result<Vec<Completion>, AppError> {
        match self {
            Db::Firestore(db) => db.get_completions_for_user(user_id).await,
            Db::Memory(store) => store.get_completions_for_user(user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_id() {
        let a = new_document_id().unwrap();
        let b = new_document_id().unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
