use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Identity used by every error record.
pub const ERROR_IDENTITY: &str = "Error";

/// Index used by every error record.
pub const ERROR_INDEX: i64 = -1;

/// Prefix of the failure message stored in an error record's timestamp.
pub const ERROR_PREFIX: &str = "Thread error: ";

// ---------------------------------------------------------------------------
// ResultRecord
// ---------------------------------------------------------------------------

/// Outcome of one worker unit, success or failure.
///
/// Fields are private so a record cannot change after it is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    index: i64,
    identity: String,
    timestamp: String,
}

impl ResultRecord {
    /// A successful record for the unit submitted at `index`.
    pub fn success(index: usize, identity: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            index: index as i64,
            identity: identity.into(),
            timestamp: timestamp.into(),
        }
    }

    /// The canonical error record: `{-1, "Error", "Thread error: <message>"}`.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            index: ERROR_INDEX,
            identity: ERROR_IDENTITY.to_string(),
            timestamp: format!("{ERROR_PREFIX}{message}"),
        }
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn is_error(&self) -> bool {
        self.index == ERROR_INDEX && self.identity == ERROR_IDENTITY
    }
}

impl From<WorkerError> for ResultRecord {
    fn from(err: WorkerError) -> Self {
        Self::error(err)
    }
}

// ---------------------------------------------------------------------------
// TimeSnapshot
// ---------------------------------------------------------------------------

/// A formatted wall-clock reading and its epoch value, taken from one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSnapshot {
    pub formatted_time: String,
    pub epoch_millis: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_record_is_canonical() {
        let record = ResultRecord::error("boom");
        assert_eq!(record.index(), -1);
        assert_eq!(record.identity(), "Error");
        assert_eq!(record.timestamp(), "Thread error: boom");
        assert!(record.is_error());
    }

    #[test]
    fn worker_error_converts_to_error_record() {
        let record: ResultRecord = WorkerError::Cancelled(7).into();
        assert!(record.is_error());
        assert_eq!(record.timestamp(), "Thread error: unit 7 was cancelled");
    }

    #[test]
    fn success_record_is_not_error() {
        let record = ResultRecord::success(0, "virtual-worker-0", "2026-01-01 00:00:00.000");
        assert!(!record.is_error());
        assert_eq!(record.index(), 0);
    }

    #[test]
    fn record_serializes_plain_fields() {
        let record = ResultRecord::success(2, "virtual-worker-9", "2026-01-01 10:00:00.250");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "index": 2,
                "identity": "virtual-worker-9",
                "timestamp": "2026-01-01 10:00:00.250",
            })
        );
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snap = TimeSnapshot {
            formatted_time: "2026-01-01 10:00:00".into(),
            epoch_millis: 1_767_261_600_000,
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["formattedTime"], "2026-01-01 10:00:00");
        assert_eq!(json["epochMillis"], 1_767_261_600_000i64);
    }
}
