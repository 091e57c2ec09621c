// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage, keyed by external ID)
//! - Challenges
//! - Completions (keyed by a hash of their natural key)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Challenge, Completion, User};
use crate::services::streak::{reset_streaks, StreakChange};
use chrono::{DateTime, NaiveDate, Utc};
use firestore::errors::{BackoffError, FirestoreError};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, external_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(external_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create the user document unless one already exists.
    ///
    /// Returns `false` when the document was already there.
    pub async fn insert_user(&self, user: &User) -> Result<bool, AppError> {
        let result: Result<User, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.external_id)
            .object(user)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    // ─── Challenge Operations ────────────────────────────────────

    pub async fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, AppError> {
        read_challenge(self.get_client()?, challenge_id).await
    }

    /// Create or overwrite a challenge.
    pub async fn set_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGES)
            .document_id(&challenge.id)
            .object(challenge)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Apply a streak change to a challenge inside a transaction.
    ///
    /// Reads inside the transaction register the challenge and its
    /// completions for conflict detection, so a concurrent writer forces a
    /// retry with fresh data. Only the streak fields are written.
    pub async fn update_streaks(
        &self,
        challenge_id: &str,
        user_id: &str,
        change: StreakChange,
    ) -> Result<Option<Challenge>, AppError> {
        let challenge_id = challenge_id.to_string();
        let user_id = user_id.to_string();

        self.get_client()?
            .run_transaction::<_, _, AppError>(move |db, transaction| {
                let challenge_id = challenge_id.clone();
                let user_id = user_id.clone();

                Box::pin(async move {
                    let Some(mut challenge) = read_challenge(&db, &challenge_id)
                        .await
                        .map_err(BackoffError::permanent)?
                    else {
                        return Ok(None);
                    };

                    if !change.apply_incremental(&mut challenge) {
                        let dates: Vec<NaiveDate> =
                            query_completions(&db, &challenge_id, &user_id)
                                .await
                                .map_err(BackoffError::permanent)?
                                .into_iter()
                                .map(|c| c.date)
                                .collect();
                        reset_streaks(&mut challenge, &dates);
                    }

                    db.fluent()
                        .update()
                        .fields(firestore::paths!(Challenge::{
                            current_streak,
                            longest_streak,
                            last_completed_date
                        }))
                        .in_col(collections::CHALLENGES)
                        .document_id(&challenge_id)
                        .object(&challenge)
                        .add_to_transaction(transaction)
                        .map_err(|e| {
                            BackoffError::permanent(AppError::Database(format!(
                                "Failed to add streak update to transaction: {}",
                                e
                            )))
                        })?;

                    Ok(Some(challenge))
                })
            })
            .await
            .map_err(|e| transaction_error("Streak update failed", e))
    }

    /// Transition a challenge to completed inside a transaction.
    ///
    /// Fails with `ChallengeNotActive` if it was already completed, including
    /// by a concurrent request.
    pub async fn complete_challenge(
        &self,
        challenge_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Challenge>, AppError> {
        let challenge_id = challenge_id.to_string();

        self.get_client()?
            .run_transaction::<_, _, AppError>(move |db, transaction| {
                let challenge_id = challenge_id.clone();

                Box::pin(async move {
                    let Some(mut challenge) = read_challenge(&db, &challenge_id)
                        .await
                        .map_err(BackoffError::permanent)?
                    else {
                        return Ok(None);
                    };

                    challenge.complete(now).map_err(BackoffError::permanent)?;

                    db.fluent()
                        .update()
                        .fields(firestore::paths!(Challenge::{active, completed_at}))
                        .in_col(collections::CHALLENGES)
                        .document_id(&challenge_id)
                        .object(&challenge)
                        .add_to_transaction(transaction)
                        .map_err(|e| {
                            BackoffError::permanent(AppError::Database(format!(
                                "Failed to add completion to transaction: {}",
                                e
                            )))
                        })?;

                    Ok(Some(challenge))
                })
            })
            .await
            .map_err(|e| transaction_error("Challenge completion failed", e))
    }

    /// All challenges owned by a user, newest first.
    pub async fn get_challenges_for_user(&self, user_id: &str) -> Result<Vec<Challenge>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a challenge and every completion recorded against it.
    ///
    /// Returns the number of completions removed.
    pub async fn delete_challenge_cascade(&self, challenge_id: &str) -> Result<usize, AppError> {
        let challenge_id_owned = challenge_id.to_string();
        let completions: Vec<Completion> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COMPLETIONS)
            .filter(move |q| q.for_all([q.field("challenge_id").eq(challenge_id_owned.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = completions.len();
        self.batch_delete(&completions, collections::COMPLETIONS, |c: &Completion| {
            c.id.clone()
        })
        .await?;
        tracing::debug!(challenge_id, count, "Deleted completions");

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CHALLENGES)
            .document_id(challenge_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count)
    }

    // ─── Completion Operations ───────────────────────────────────

    pub async fn get_completion(&self, completion_id: &str) -> Result<Option<Completion>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COMPLETIONS)
            .obj()
            .one(completion_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a completion unless its natural key is already taken.
    ///
    /// Firestore rejects the insert with a conflict when the document
    /// exists, which is what makes concurrent marks for the same day safe.
    pub async fn insert_completion(&self, completion: &Completion) -> Result<bool, AppError> {
        let result: Result<Completion, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::COMPLETIONS)
            .document_id(&completion.id)
            .object(completion)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    pub async fn delete_completion(&self, completion_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::COMPLETIONS)
            .document_id(completion_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Completions for one challenge, oldest first.
    pub async fn get_completions_for_challenge(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<Vec<Completion>, AppError> {
        query_completions(self.get_client()?, challenge_id, user_id).await
    }

    /// Every completion a user has logged, most recent day first.
    pub async fn get_completions_for_user(&self, user_id: &str) -> Result<Vec<Completion>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMPLETIONS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

async fn read_challenge(
    client: &firestore::FirestoreDb,
    challenge_id: &str,
) -> Result<Option<Challenge>, AppError> {
    client
        .fluent()
        .select()
        .by_id_in(collections::CHALLENGES)
        .obj()
        .one(challenge_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

async fn query_completions(
    client: &firestore::FirestoreDb,
    challenge_id: &str,
    user_id: &str,
) -> Result<Vec<Completion>, AppError> {
    let challenge_id = challenge_id.to_string();
    let user_id = user_id.to_string();
    client
        .fluent()
        .select()
        .from(collections::COMPLETIONS)
        .filter(move |q| {
            q.for_all([
                q.field("challenge_id").eq(challenge_id.clone()),
                q.field("user_id").eq(user_id.clone()),
            ])
        })
        .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
        .obj()
        .query()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Unwrap an error raised inside a transaction closure back into the
/// `AppError` it started as.
fn transaction_error(context: &str, err: FirestoreError) -> AppError {
    match err {
        FirestoreError::ErrorInTransaction(inner) => match inner.source.downcast::<AppError>() {
            Ok(app_error) => *app_error,
            Err(source) => AppError::Database(format!("{}: {}", context, source)),
        },
        other => AppError::Database(format!("{}: {}", context, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_offline();

        let err = db.get_challenge("c1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let err = db.get_completions_for_user("u1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_transaction_error_keeps_domain_error() {
        let inner = firestore::errors::FirestoreErrorInTransaction {
            transaction_id: Vec::new(),
            source: Box::new(AppError::ChallengeNotActive("c1".to_string())),
        };
        let err = transaction_error("completion", FirestoreError::ErrorInTransaction(inner));
        assert!(matches!(err, AppError::ChallengeNotActive(id) if id == "c1"));
    }
}
