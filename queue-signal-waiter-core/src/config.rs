//! Wait configuration: raw options, range validation, and the immutable
//! configuration handed to the aggregator.

use crate::error::{QueueSignalWaiterError, QueueSignalWaiterResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_TIMEOUT_MS: u64 = 10_000;
pub const MAX_TIMEOUT_MS: u64 = 3_600_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

/// Bounded above by the SQS long-poll limit.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;
pub const MAX_POLL_INTERVAL_SECS: u64 = 20;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

pub const MIN_REQUIRED_SIGNALS: usize = 1;
pub const MAX_REQUIRED_SIGNALS: usize = 100;
pub const DEFAULT_REQUIRED_SIGNALS: usize = 1;

/// Region used when neither the caller nor the ambient AWS configuration names one.
pub const FALLBACK_REGION: &str = "us-east-1";

/// Options as a caller supplies them, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Queue URL, or a queue name to be resolved to one.
    pub queue: String,
    pub region: Option<String>,
    pub timeout_ms: u64,
    pub poll_interval_secs: u64,
    pub required_signals: usize,
    pub delete_messages: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            queue: String::new(),
            region: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            required_signals: DEFAULT_REQUIRED_SIGNALS,
            delete_messages: true,
        }
    }
}

impl WaitOptions {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            ..Self::default()
        }
    }

    /// Check every option against its allowed range. All violations are
    /// reported together.
    pub fn validate(&self) -> QueueSignalWaiterResult<()> {
        let mut problems = Vec::new();

        if self.queue.trim().is_empty() {
            problems.push("queue must not be empty".to_string());
        }
        if let Some(region) = &self.region {
            if region.trim().is_empty() {
                problems.push("region must not be empty when given".to_string());
            }
        }
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            problems.push(format!(
                "timeout_ms {} is outside {MIN_TIMEOUT_MS}..={MAX_TIMEOUT_MS}",
                self.timeout_ms
            ));
        }
        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs) {
            problems.push(format!(
                "poll_interval_secs {} is outside {MIN_POLL_INTERVAL_SECS}..={MAX_POLL_INTERVAL_SECS}",
                self.poll_interval_secs
            ));
        }
        if !(MIN_REQUIRED_SIGNALS..=MAX_REQUIRED_SIGNALS).contains(&self.required_signals) {
            problems.push(format!(
                "required_signals {} is outside {MIN_REQUIRED_SIGNALS}..={MAX_REQUIRED_SIGNALS}",
                self.required_signals
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(QueueSignalWaiterError::config(problems.join("; ")))
        }
    }

    /// Validate and freeze into an [`AggregatorConfig`]. `queue_url` and
    /// `region` are the caller-resolved values.
    pub fn into_config(
        self,
        queue_url: impl Into<String>,
        region: impl Into<String>,
    ) -> QueueSignalWaiterResult<AggregatorConfig> {
        self.validate()?;
        Ok(AggregatorConfig {
            queue_url: queue_url.into(),
            region: region.into(),
            timeout: Duration::from_millis(self.timeout_ms),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            required_signals: self.required_signals,
            delete_messages: self.delete_messages,
        })
    }
}

/// Fully resolved, validated input to one aggregator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    queue_url: String,
    region: String,
    timeout: Duration,
    poll_interval: Duration,
    required_signals: usize,
    delete_messages: bool,
}

impl AggregatorConfig {
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn required_signals(&self) -> usize {
        self.required_signals
    }

    pub fn delete_messages(&self) -> bool {
        self.delete_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn options() -> WaitOptions {
        WaitOptions::new("https://sqs.us-east-1.amazonaws.com/123456789012/boot-signals")
    }

    #[test]
    fn test_defaults() {
        let opts = WaitOptions::default();
        assert_eq!(opts.timeout_ms, 300_000);
        assert_eq!(opts.poll_interval_secs, 10);
        assert_eq!(opts.required_signals, 1);
        assert!(opts.delete_messages);
        assert!(opts.region.is_none());
    }

    #[test]
    fn test_valid_options_build_config() {
        let config = options()
            .into_config(
                "https://sqs.us-east-1.amazonaws.com/123456789012/boot-signals",
                "eu-west-1",
            )
            .expect("defaults should be valid");
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.required_signals(), 1);
        assert_eq!(config.region(), "eu-west-1");
        assert!(config.delete_messages());
    }

    #[rstest]
    #[case::timeout_too_short(WaitOptions { timeout_ms: 9_999, ..options() }, "timeout_ms")]
    #[case::timeout_too_long(WaitOptions { timeout_ms: 3_600_001, ..options() }, "timeout_ms")]
    #[case::poll_zero(WaitOptions { poll_interval_secs: 0, ..options() }, "poll_interval_secs")]
    #[case::poll_over_long_poll_limit(WaitOptions { poll_interval_secs: 21, ..options() }, "poll_interval_secs")]
    #[case::no_signals(WaitOptions { required_signals: 0, ..options() }, "required_signals")]
    #[case::too_many_signals(WaitOptions { required_signals: 101, ..options() }, "required_signals")]
    #[case::empty_queue(WaitOptions { queue: "  ".into(), ..options() }, "queue")]
    #[case::empty_region(WaitOptions { region: Some(String::new()), ..options() }, "region")]
    fn test_out_of_range_rejected(#[case] opts: WaitOptions, #[case] field: &str) {
        match opts.validate() {
            Err(QueueSignalWaiterError::Config(msg)) => {
                assert!(msg.contains(field), "message was: {msg}")
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[rstest]
    #[case(WaitOptions { timeout_ms: 10_000, poll_interval_secs: 1, required_signals: 1, ..options() })]
    #[case(WaitOptions { timeout_ms: 3_600_000, poll_interval_secs: 20, required_signals: 100, ..options() })]
    fn test_boundaries_accepted(#[case] opts: WaitOptions) {
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_all_problems_reported_together() {
        let opts = WaitOptions {
            queue: String::new(),
            timeout_ms: 1,
            required_signals: 0,
            ..WaitOptions::default()
        };
        let msg = opts.validate().unwrap_err().to_string();
        assert!(msg.contains("queue"));
        assert!(msg.contains("timeout_ms"));
        assert!(msg.contains("required_signals"));
        assert!(!msg.contains("poll_interval_secs"));
    }

    #[test]
    fn test_options_from_json_use_defaults() {
        let opts: WaitOptions =
            serde_json::from_str(r#"{"queue": "boot-signals", "required_signals": 3}"#).unwrap();
        assert_eq!(opts.queue, "boot-signals");
        assert_eq!(opts.required_signals, 3);
        assert_eq!(opts.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(opts.delete_messages);
    }
}
