//! Queue access: the client seam the aggregator polls through, the SQS
//! implementation of it, and error classification.

pub mod classify;
pub(crate) mod sqs_client;

use crate::types::{DeleteEntry, DeleteOutcome, SignalRecord};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use sqs_client::AwsSqsClient;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AwsError {
    #[error("AWS configuration error: {0}")]
    ConfigError(String),
    /// The service answered with an error. `code` is the provider error code
    /// when the response carried one.
    #[error("SQS {operation} failed{}: {message}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Service {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },
    /// The request never produced a service response (dispatch, timeout, I/O).
    #[error("SQS transport error: {0}")]
    Transport(String),
}

pub type AwsResult<T> = Result<T, AwsError>;

/// Narrow view of a message queue used by the aggregator.
///
/// `receive` may block for up to `wait` (long poll). Implementations must not
/// return more than `max_messages` records.
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> AwsResult<Vec<SignalRecord>>;

    async fn delete_batch(&self, queue: &str, entries: &[DeleteEntry]) -> AwsResult<DeleteOutcome>;

    /// Publish one message and return its provider id.
    async fn send(&self, queue: &str, _body: &str) -> AwsResult<String> {
        Err(AwsError::ConfigError(format!(
            "this queue client cannot send messages to '{queue}'"
        )))
    }
}
