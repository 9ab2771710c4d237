//! Scripted in-memory queue used by the aggregator integration tests.

use async_trait::async_trait;
use queue_signal_waiter_core::{
    AggregatorConfig, AwsError, AwsResult, DeleteEntry, DeleteFailure, DeleteOutcome,
    QueueClient, SignalRecord, WaitOptions,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/boot-signals";

/// What the queue does on one receive call.
#[allow(dead_code)]
pub enum Step {
    /// Return these messages right away.
    Messages(Vec<SignalRecord>),
    /// Long-poll for the full wait and return nothing.
    Empty,
    Fail(AwsError),
}

#[allow(dead_code)]
pub enum DeleteBehavior {
    Succeed,
    Fail(AwsError),
    /// Report every entry as failed.
    RejectAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveCall {
    pub max_messages: usize,
    pub wait: Duration,
}

pub struct ScriptedQueue {
    steps: Mutex<VecDeque<Step>>,
    delete_behavior: DeleteBehavior,
    /// When set, empty polls behave like SQS: the wait is cut to whole
    /// seconds and each call adds this round-trip time.
    sqs_round_trip: Option<Duration>,
    pub receives: Mutex<Vec<ReceiveCall>>,
    pub deletes: Mutex<Vec<Vec<DeleteEntry>>>,
}

#[allow(dead_code)]
impl ScriptedQueue {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            delete_behavior: DeleteBehavior::Succeed,
            sqs_round_trip: None,
            receives: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delete_behavior(mut self, behavior: DeleteBehavior) -> Self {
        self.delete_behavior = behavior;
        self
    }

    pub fn with_sqs_wait_semantics(mut self, round_trip: Duration) -> Self {
        self.sqs_round_trip = Some(round_trip);
        self
    }

    pub fn receive_calls(&self) -> Vec<ReceiveCall> {
        self.receives.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<Vec<DeleteEntry>> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueClient for ScriptedQueue {
    async fn receive(
        &self,
        _queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> AwsResult<Vec<SignalRecord>> {
        self.receives
            .lock()
            .unwrap()
            .push(ReceiveCall { max_messages, wait });
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Empty);
        match step {
            Step::Messages(records) => Ok(records),
            Step::Empty => {
                let wait = match self.sqs_round_trip {
                    Some(round_trip) => Duration::from_secs(wait.as_secs()) + round_trip,
                    None => wait,
                };
                tokio::time::sleep(wait).await;
                Ok(Vec::new())
            }
            Step::Fail(err) => Err(err),
        }
    }

    async fn delete_batch(&self, _queue: &str, entries: &[DeleteEntry]) -> AwsResult<DeleteOutcome> {
        self.deletes.lock().unwrap().push(entries.to_vec());
        match &self.delete_behavior {
            DeleteBehavior::Succeed => Ok(DeleteOutcome {
                deleted: entries.len(),
                failed: Vec::new(),
            }),
            DeleteBehavior::Fail(err) => Err(err.clone()),
            DeleteBehavior::RejectAll => Ok(DeleteOutcome {
                deleted: 0,
                failed: entries
                    .iter()
                    .map(|e| DeleteFailure {
                        id: e.id.clone(),
                        code: "ReceiptHandleIsInvalid".into(),
                        message: None,
                    })
                    .collect(),
            }),
        }
    }
}

pub fn signal(n: usize) -> SignalRecord {
    SignalRecord::new(format!("node-{n} ready"), format!("rh-{n}"), format!("msg-{n}"))
}

#[allow(dead_code)]
pub fn service_error(code: &str) -> AwsError {
    AwsError::Service {
        operation: "ReceiveMessage",
        code: Some(code.to_string()),
        message: format!("{code} raised by test"),
    }
}

pub fn config(timeout_ms: u64, poll_interval_secs: u64, required: usize, delete: bool) -> AggregatorConfig {
    WaitOptions {
        timeout_ms,
        poll_interval_secs,
        required_signals: required,
        delete_messages: delete,
        ..WaitOptions::new(QUEUE_URL)
    }
    .into_config(QUEUE_URL, "us-east-1")
    .expect("test config should be valid")
}
