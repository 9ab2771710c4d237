//! AWS SQS client wrapper for signal queue operations

use crate::aws::{AwsError, AwsResult, QueueClient};
use crate::types::{DeleteEntry, DeleteFailure, DeleteOutcome, SignalRecord};
use async_trait::async_trait;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::DeleteMessageBatchRequestEntry;
use aws_sdk_sqs::Client as SqsClient;
use log::{debug, trace};
use std::time::Duration;

/// Largest batch SQS accepts for ReceiveMessage and DeleteMessageBatch.
pub const SQS_MAX_BATCH_SIZE: usize = 10;

/// Longest long-poll wait SQS accepts.
pub const SQS_MAX_WAIT_SECONDS: u64 = 20;

#[derive(Debug, Clone)]
pub struct AwsSqsClient {
    client: SqsClient,
}

impl AwsSqsClient {
    pub fn new(client: SqsClient) -> Self {
        Self { client }
    }

    /// Accepts either a queue URL or a bare queue name. Names are resolved
    /// with GetQueueUrl, URLs are returned unchanged.
    pub async fn resolve_queue_url(&self, queue: &str) -> AwsResult<String> {
        if is_queue_url(queue) {
            return Ok(queue.to_string());
        }

        debug!("Resolving URL for queue name '{}'", queue);
        let response = self
            .client
            .get_queue_url()
            .queue_name(queue)
            .send()
            .await
            .map_err(|e| sdk_error("GetQueueUrl", e))?;

        response.queue_url.ok_or_else(|| AwsError::Service {
            operation: "GetQueueUrl",
            code: None,
            message: format!("no URL returned for queue '{queue}'"),
        })
    }
}

#[async_trait]
impl QueueClient for AwsSqsClient {
    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> AwsResult<Vec<SignalRecord>> {
        let max_messages = max_messages.clamp(1, SQS_MAX_BATCH_SIZE);
        let wait_seconds = wait.as_secs().min(SQS_MAX_WAIT_SECONDS);
        trace!(
            "ReceiveMessage on {} (max: {}, wait: {}s)",
            queue,
            max_messages,
            wait_seconds
        );

        let response = self
            .client
            .receive_message()
            .queue_url(queue)
            // Both values are bounded by the SQS limits above.
            .max_number_of_messages(i32::try_from(max_messages).unwrap_or(1))
            .wait_time_seconds(i32::try_from(wait_seconds).unwrap_or(0))
            .send()
            .await
            .map_err(|e| sdk_error("ReceiveMessage", e))?;

        Ok(response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| SignalRecord {
                body: message.body,
                receipt_handle: message.receipt_handle,
                message_id: message.message_id,
            })
            .collect())
    }

    async fn delete_batch(&self, queue: &str, entries: &[DeleteEntry]) -> AwsResult<DeleteOutcome> {
        let mut outcome = DeleteOutcome::default();

        for chunk in entries.chunks(SQS_MAX_BATCH_SIZE) {
            let request_entries = chunk
                .iter()
                .map(|entry| {
                    DeleteMessageBatchRequestEntry::builder()
                        .id(&entry.id)
                        .receipt_handle(&entry.receipt_handle)
                        .build()
                        .map_err(|e| {
                            AwsError::ConfigError(format!(
                                "Failed to build delete entry '{}': {e}",
                                entry.id
                            ))
                        })
                })
                .collect::<AwsResult<Vec<_>>>()?;

            let response = self
                .client
                .delete_message_batch()
                .queue_url(queue)
                .set_entries(Some(request_entries))
                .send()
                .await
                .map_err(|e| sdk_error("DeleteMessageBatch", e))?;

            outcome.deleted += response.successful().len();
            outcome
                .failed
                .extend(response.failed().iter().map(|failure| DeleteFailure {
                    id: failure.id().to_string(),
                    code: failure.code().to_string(),
                    message: failure.message().map(str::to_string),
                }));
        }

        Ok(outcome)
    }

    async fn send(&self, queue: &str, body: &str) -> AwsResult<String> {
        let response = self
            .client
            .send_message()
            .queue_url(queue)
            .message_body(body)
            .send()
            .await
            .map_err(|e| sdk_error("SendMessage", e))?;

        response.message_id.ok_or_else(|| AwsError::Service {
            operation: "SendMessage",
            code: None,
            message: "no message id returned".to_string(),
        })
    }
}

fn is_queue_url(queue: &str) -> bool {
    queue.starts_with("https://") || queue.starts_with("http://")
}

/// Keep the provider error code when the service sent one, so classification
/// can match it exactly.
fn sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some(code) => AwsError::Service {
            operation,
            code: Some(code.to_string()),
            message: err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
        },
        None => AwsError::Transport(format!(
            "{operation}: {}",
            DisplayErrorContext(&err)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_queue_url() {
        assert!(is_queue_url(
            "https://sqs.us-east-1.amazonaws.com/123456789012/boot-signals"
        ));
        assert!(is_queue_url("http://localhost:4566/000000000000/boot-signals"));
        assert!(!is_queue_url("boot-signals"));
    }

    #[test]
    fn test_sdk_error_without_response_is_transport() {
        let err: SdkError<aws_sdk_sqs::operation::receive_message::ReceiveMessageError, ()> =
            SdkError::timeout_error("read timed out");
        match sdk_error("ReceiveMessage", err) {
            AwsError::Transport(msg) => assert!(msg.starts_with("ReceiveMessage")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
