//! Terminal errors surfaced by a wait run and the service layer around it.

use crate::aws::AwsError;
use std::time::Duration;
use thiserror::Error;

/// Every way a run can end other than success. Exactly one of these is
/// returned per failed run; there is no partial result.
#[derive(Error, Debug)]
pub enum QueueSignalWaiterError {
    /// Rejected before the polling loop started. Never retried.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(
        "Timed out after {elapsed:?} waiting for signals: received {received} of {required} after {polls} poll(s)"
    )]
    Timeout {
        elapsed: Duration,
        received: usize,
        required: usize,
        polls: u32,
    },

    /// The queue reported a condition retrying cannot fix.
    #[error("Queue error on poll {polls} is not retryable: {source}")]
    FatalQueue {
        polls: u32,
        #[source]
        source: AwsError,
    },

    #[error("Wait cancelled: received {received} of {required} after {polls} poll(s)")]
    Cancelled {
        received: usize,
        required: usize,
        polls: u32,
    },

    /// AWS failure outside the polling loop (client setup, queue URL lookup, send).
    #[error(transparent)]
    Aws(#[from] AwsError),
}

impl QueueSignalWaiterError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type QueueSignalWaiterResult<T> = Result<T, QueueSignalWaiterError>;
