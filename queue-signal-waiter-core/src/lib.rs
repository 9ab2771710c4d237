//! This crate provides the core logic for Queue Signal Waiter:
//! - Configuration validation for a wait run
//! - The signal aggregation loop (poll, accumulate, acknowledge, time out)
//! - Error classification for queue failures
//! - An SQS-backed queue client and the service layer wiring them together
//!

pub mod aggregator;
pub mod aws;
pub mod commands;
pub mod config;
mod error;
mod types;

// Re-exports for a small, focused public API
pub use aggregator::{SignalAggregator, MAX_BATCH_SIZE, TRANSIENT_ERROR_BACKOFF};
pub use aws::classify::{classify, ErrorClass};
pub use aws::{AwsError, AwsResult, AwsSqsClient, QueueClient};
pub use commands::{QueueSignalWaiterService, ServiceOptions};
pub use config::{AggregatorConfig, WaitOptions};
pub use error::{QueueSignalWaiterError, QueueSignalWaiterResult};
pub use types::{
    DeleteEntry, DeleteFailure, DeleteOutcome, PollProgress, RunResult, SignalRecord,
    DEFAULT_SIGNAL_BODY,
};
