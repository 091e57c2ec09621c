// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User provisioning.

use chrono::Utc;

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::User;

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        self.db.get_user(external_id).await
    }

    /// Create the user on first sign-in; later calls return the stored record.
    pub async fn ensure_user(&self, external_id: &str, email: &str) -> Result<User> {
        let user = User::new(external_id, email.trim(), Utc::now());

        if self.db.insert_user(&user).await? {
            tracing::info!(external_id, "New user created");
            return Ok(user);
        }

        self.db.get_user(external_id).await?.ok_or_else(|| {
            AppError::Database(format!("User {} removed during sign-in", external_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let service = UserService::new(Db::memory());

        let first = service.ensure_user("ext_1", "a@example.com").await.unwrap();
        let second = service.ensure_user("ext_1", "b@example.com").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.email, "a@example.com");
        assert_eq!(
            service.get_by_external_id("ext_1").await.unwrap(),
            Some(first)
        );
        assert_eq!(service.get_by_external_id("ext_2").await.unwrap(), None);
    }
}
