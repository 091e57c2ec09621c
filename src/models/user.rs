//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// Created on first sign-in; the identity provider owns everything else
/// about the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identity-provider subject (also used as document ID)
    pub external_id: String,
    /// Email address reported by the identity provider
    pub email: String,
    /// When the user first signed in
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(external_id: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            external_id: external_id.into(),
            email: email.into(),
            created_at: now,
        }
    }
}
