//! Records, progress snapshots and results exchanged with the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body recorded for a signal whose message body is absent or empty.
pub const DEFAULT_SIGNAL_BODY: &str = "ready";

/// One message read from the queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignalRecord {
    pub body: Option<String>,
    /// Opaque token, only used to delete this delivery of the message.
    pub receipt_handle: Option<String>,
    pub message_id: Option<String>,
}

impl SignalRecord {
    pub fn new(body: impl Into<String>, receipt_handle: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            receipt_handle: Some(receipt_handle.into()),
            message_id: Some(message_id.into()),
        }
    }

    /// The body as accumulated into the run, with [`DEFAULT_SIGNAL_BODY`]
    /// substituted for a missing or empty one.
    pub fn signal_body(&self) -> String {
        match self.body.as_deref() {
            Some(body) if !body.is_empty() => body.to_string(),
            _ => DEFAULT_SIGNAL_BODY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntry {
    /// Batch-local id, unique within one delete request.
    pub id: String,
    pub receipt_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub id: String,
    pub code: String,
    pub message: Option<String>,
}

/// Per-entry result of a batched delete.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    pub deleted: usize,
    pub failed: Vec<DeleteFailure>,
}

/// Snapshot reported after every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollProgress {
    pub poll: u32,
    pub elapsed: Duration,
    pub remaining: Duration,
    pub received: usize,
    pub required: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub signals: Vec<String>,
    pub signal_count: usize,
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: Duration,
    pub polls: u32,
    pub completed_at: DateTime<Utc>,
    /// Signals whose deletion was requested but not confirmed by the queue.
    pub unacknowledged: usize,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_body_defaults_when_empty_or_missing() {
        let empty = SignalRecord::new("", "rh", "id");
        assert_eq!(empty.signal_body(), DEFAULT_SIGNAL_BODY);

        let missing = SignalRecord::default();
        assert_eq!(missing.signal_body(), "ready");

        let present = SignalRecord::new("web-1 booted", "rh", "id");
        assert_eq!(present.signal_body(), "web-1 booted");
    }

    #[test]
    fn test_run_result_json_shape() {
        let result = RunResult {
            signals: vec!["ready".into()],
            signal_count: 1,
            elapsed: Duration::from_millis(1500),
            polls: 2,
            completed_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            unacknowledged: 0,
        };
        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["elapsed_ms"], 1500);
        assert_eq!(json["signal_count"], 1);
        assert_eq!(json["completed_at"], "2024-05-01T12:00:00Z");
    }
}
