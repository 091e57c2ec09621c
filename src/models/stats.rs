//! Derived statistics returned alongside challenges.
//!
//! Nothing here is stored; it is recomputed from the challenge and its
//! completions on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Progress numbers for a single challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeStats {
    /// Days covered by the challenge (inclusive)
    pub total_days: i64,
    /// Days with a completion inside the counted range
    pub completed_days: i64,
    /// `total_days - completed_days`, never negative
    pub missed_days: i64,
    /// Rounded percentage; only set for completed challenges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}
