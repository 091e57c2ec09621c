//! Completion records: one per (challenge, user, calendar day).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::format_day_key;

/// Stored completion record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Completion {
    /// Derived from the natural key, see [`Completion::natural_key_id`]
    pub id: String,
    pub challenge_id: String,
    pub user_id: String,
    /// Calendar day, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Completion {
    pub fn new(
        challenge_id: &str,
        user_id: &str,
        date: NaiveDate,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::natural_key_id(challenge_id, user_id, date),
            challenge_id: challenge_id.to_string(),
            user_id: user_id.to_string(),
            date,
            note,
            created_at: now,
        }
    }

    /// Document ID for a natural key.
    ///
    /// Two writers for the same (challenge, user, date) target the same
    /// document, so a create-if-absent insert lets the store reject the
    /// second one.
    pub fn natural_key_id(challenge_id: &str, user_id: &str, date: NaiveDate) -> String {
        let mut hasher = Sha256::new();
        hasher.update(challenge_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(user_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(format_day_key(date).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_key_id_is_stable_and_distinct() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let a = Completion::natural_key_id("c1", "u1", d);
        assert_eq!(a, Completion::natural_key_id("c1", "u1", d));
        assert_eq!(a.len(), 64);

        assert_ne!(a, Completion::natural_key_id("c1", "u2", d));
        assert_ne!(a, Completion::natural_key_id("c1", "u1", d.succ_opt().unwrap()));
        // Separator keeps ("c1u", "1") apart from ("c1", "u1")
        assert_ne!(a, Completion::natural_key_id("c1u", "1", d));
    }

    #[test]
    fn test_date_serializes_as_calendar_string() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let c = Completion::new("c1", "u1", d, None, Utc::now());
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["date"], "2024-03-09");
    }
}
