//! Wait logic for Queue Signal Waiter service

use crate::aggregator::SignalAggregator;
use crate::config::WaitOptions;
use crate::error::{QueueSignalWaiterError, QueueSignalWaiterResult};
use crate::types::RunResult;
use log::info;
use tokio_util::sync::CancellationToken;

impl super::service::QueueSignalWaiterService {
    /// Validate `options`, resolve the queue URL, and block until the required
    /// signals arrive, the deadline passes, or `cancel` fires.
    pub async fn wait(
        &self,
        options: WaitOptions,
        cancel: &CancellationToken,
    ) -> QueueSignalWaiterResult<RunResult> {
        options.validate()?;
        check_region(options.region.as_deref(), &self.region)?;

        let queue_url = self.sqs_client.resolve_queue_url(&options.queue).await?;
        if queue_url != options.queue {
            info!("Resolved queue '{}' to {}", options.queue, queue_url);
        }

        let config = options.into_config(queue_url, self.region.clone())?;
        SignalAggregator::new(&self.sqs_client)
            .run_with_cancellation(&config, cancel)
            .await
    }
}

/// The client is bound to one region; options naming another would poll the
/// wrong queue.
fn check_region(requested: Option<&str>, resolved: &str) -> QueueSignalWaiterResult<()> {
    match requested {
        Some(requested) if requested != resolved => Err(QueueSignalWaiterError::config(format!(
            "region '{requested}' does not match the service region '{resolved}'"
        ))),
        _ => Ok(()),
    }
}
