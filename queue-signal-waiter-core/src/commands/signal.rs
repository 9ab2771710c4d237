//! Signal sending for Queue Signal Waiter service

use crate::aws::QueueClient;
use crate::error::{QueueSignalWaiterError, QueueSignalWaiterResult};
use crate::types::DEFAULT_SIGNAL_BODY;
use log::info;

impl super::service::QueueSignalWaiterService {
    /// Send `count` readiness signals to `queue`, as a bootstrap script would.
    /// Returns the provider message ids in send order.
    pub async fn signal(
        &self,
        queue: &str,
        body: Option<&str>,
        count: usize,
    ) -> QueueSignalWaiterResult<Vec<String>> {
        if queue.trim().is_empty() {
            return Err(QueueSignalWaiterError::config("queue must not be empty"));
        }
        let queue_url = self.sqs_client.resolve_queue_url(queue).await?;
        send_signals(&self.sqs_client, &queue_url, body, count).await
    }
}

pub(crate) async fn send_signals<C: QueueClient + ?Sized>(
    client: &C,
    queue_url: &str,
    body: Option<&str>,
    count: usize,
) -> QueueSignalWaiterResult<Vec<String>> {
    if count == 0 {
        return Err(QueueSignalWaiterError::config(
            "signal count must be at least 1",
        ));
    }
    let body = body.filter(|b| !b.is_empty()).unwrap_or(DEFAULT_SIGNAL_BODY);

    let mut message_ids = Vec::with_capacity(count);
    for _ in 0..count {
        let message_id = client.send(queue_url, body).await?;
        info!("Sent signal {} to {}", message_id, queue_url);
        message_ids.push(message_id);
    }
    Ok(message_ids)
}
