//! External JSON shape of a process and its flat persistence row.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::ErrorRecord;
use super::state::State;

/// A value together with the unix time (seconds) it was recorded at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamped<T> {
    pub timestamp: i64,
    pub value: T,
}

/// Failure counter plus the most recent error records, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSummary {
    pub count: u64,
    pub last: Vec<ErrorRecord>,
}

/// Snapshot reported to observers of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    pub company_id: i64,
    pub plugin_id: i64,
    pub description: Option<String>,
    pub state: Stamped<State>,
    pub initialized: Option<Stamped<Option<u64>>>,
    pub handled: u64,
    pub skipped: u64,
    pub failed: FailedSummary,
    pub result: Option<Stamped<Value>>,
}

/// Flat record handed to a [`ProcessStore`](crate::store::ProcessStore).
///
/// Timestamps are unix seconds. `errors` holds the JSON-encoded error log and
/// `result` the JSON-encoded `{"type", "value"}` outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRow {
    pub id: String,
    pub company_id: i64,
    pub plugin_id: i64,
    pub created_at: i64,
    pub state: String,
    pub updated_at: i64,
    pub initialized: Option<u64>,
    pub initialized_at: Option<i64>,
    pub handled: u64,
    pub skipped: u64,
    pub failed: u64,
    pub errors: String,
    pub result: Option<String>,
    pub description: Option<String>,
}
