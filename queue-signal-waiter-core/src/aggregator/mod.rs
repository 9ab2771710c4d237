//! Signal aggregation loop.
//!
//! Polls a [`QueueClient`] until `required_signals` messages have been read or
//! the deadline passes. Every long-poll wait is clipped to the time left, so a
//! run overshoots its deadline by at most one round-trip.

mod state;

use crate::aws::classify::{classify, ErrorClass};
use crate::aws::QueueClient;
use crate::config::AggregatorConfig;
use crate::error::{QueueSignalWaiterError, QueueSignalWaiterResult};
use crate::types::{PollProgress, RunResult, SignalRecord};
use log::{debug, info, warn};
use state::RunState;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Most messages requested in one receive call.
pub const MAX_BATCH_SIZE: usize = 10;

/// Pause after a transient receive error before polling again.
pub const TRANSIENT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Shortest wait worth a receive call. The queue counts waits in whole
/// seconds, so anything shorter turns into an immediate short poll.
pub const MIN_POLL_WAIT: Duration = Duration::from_secs(1);

type ProgressObserver<'a> = Box<dyn Fn(&PollProgress) + Send + Sync + 'a>;

pub struct SignalAggregator<'a, C: QueueClient + ?Sized> {
    client: &'a C,
    backoff: Duration,
    progress: Option<ProgressObserver<'a>>,
}

impl<'a, C: QueueClient + ?Sized> SignalAggregator<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            backoff: TRANSIENT_ERROR_BACKOFF,
            progress: None,
        }
    }

    /// Called after every poll, successful or not.
    pub fn with_progress(mut self, observer: impl Fn(&PollProgress) + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(observer));
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn run(&self, config: &AggregatorConfig) -> QueueSignalWaiterResult<RunResult> {
        self.run_with_cancellation(config, &CancellationToken::new())
            .await
    }

    /// Same as [`run`](Self::run), but gives up with
    /// [`QueueSignalWaiterError::Cancelled`] once `cancel` fires.
    pub async fn run_with_cancellation(
        &self,
        config: &AggregatorConfig,
        cancel: &CancellationToken,
    ) -> QueueSignalWaiterResult<RunResult> {
        let required = config.required_signals();
        let mut state = RunState::start(config.timeout());

        info!(
            "Waiting for {} signal(s) on {} ({}) for up to {:?}",
            required,
            config.queue_url(),
            config.region(),
            config.timeout()
        );

        while !state.deadline_passed() && state.received() < required {
            let remaining = state.remaining();
            if remaining < MIN_POLL_WAIT {
                debug!("{:?} left, too short for another poll", remaining);
                tokio::select! {
                    () = tokio::time::sleep_until(state.deadline) => {}
                    () = cancel.cancelled() => return Err(cancelled(&state, required)),
                }
                break;
            }

            state.polls += 1;
            let max_messages = MAX_BATCH_SIZE.min(required - state.received());
            let wait = config.poll_interval().min(remaining);
            debug!(
                "Poll {}: requesting up to {} message(s), waiting {:?}",
                state.polls, max_messages, wait
            );

            let received = tokio::select! {
                result = self.client.receive(config.queue_url(), max_messages, wait) => result,
                () = cancel.cancelled() => return Err(cancelled(&state, required)),
            };

            match received {
                Ok(records) => self.absorb(config, &mut state, records).await,
                Err(err) => match classify(&err) {
                    ErrorClass::Fatal => {
                        warn!("Poll {} failed with a non-retryable error: {}", state.polls, err);
                        return Err(QueueSignalWaiterError::FatalQueue {
                            polls: state.polls,
                            source: err,
                        });
                    }
                    ErrorClass::Transient => {
                        warn!(
                            "Poll {} failed, retrying in {:?}: {}",
                            state.polls, self.backoff, err
                        );
                        self.report(&state, required);
                        let resume_at = (Instant::now() + self.backoff).min(state.deadline);
                        tokio::select! {
                            () = tokio::time::sleep_until(resume_at) => {}
                            () = cancel.cancelled() => return Err(cancelled(&state, required)),
                        }
                        continue;
                    }
                },
            }

            self.report(&state, required);
        }

        if state.received() >= required {
            let result = state.finish();
            info!(
                "Received {} of {} signal(s) in {:?} after {} poll(s)",
                result.signal_count, required, result.elapsed, result.polls
            );
            Ok(result)
        } else {
            Err(QueueSignalWaiterError::Timeout {
                elapsed: state.elapsed(),
                received: state.received(),
                required,
                polls: state.polls,
            })
        }
    }

    /// Record a batch of messages, then acknowledge them in one delete call.
    /// Signals count as received whether or not the delete succeeds.
    async fn absorb(
        &self,
        config: &AggregatorConfig,
        state: &mut RunState,
        records: Vec<SignalRecord>,
    ) {
        if records.is_empty() {
            return;
        }
        debug!("Poll {} returned {} message(s)", state.polls, records.len());

        for record in records {
            state.signals.push(record.signal_body());
            if !config.delete_messages() {
                continue;
            }
            match record.receipt_handle {
                Some(handle) => state.stage_delete(record.message_id, handle),
                None => warn!(
                    "Message {} has no receipt handle and cannot be deleted",
                    record.message_id.as_deref().unwrap_or("<unknown>")
                ),
            }
        }

        if state.pending_deletes.is_empty() {
            return;
        }

        let entries = std::mem::take(&mut state.pending_deletes);
        match self.client.delete_batch(config.queue_url(), &entries).await {
            Ok(outcome) => {
                for failure in &outcome.failed {
                    warn!(
                        "Failed to delete message {}: {} {}",
                        failure.id,
                        failure.code,
                        failure.message.as_deref().unwrap_or_default()
                    );
                }
                state.unacknowledged += outcome.failed.len();
                debug!("Deleted {} message(s)", outcome.deleted);
            }
            Err(err) => {
                warn!("Failed to delete {} message(s): {}", entries.len(), err);
                state.unacknowledged += entries.len();
            }
        }
    }

    fn report(&self, state: &RunState, required: usize) {
        let progress = PollProgress {
            poll: state.polls,
            elapsed: state.elapsed(),
            remaining: state.remaining(),
            received: state.received(),
            required,
        };
        info!(
            "Poll {}: {}/{} signal(s) received, {:.1}s elapsed, {:.1}s remaining",
            progress.poll,
            progress.received,
            progress.required,
            progress.elapsed.as_secs_f64(),
            progress.remaining.as_secs_f64()
        );
        if let Some(observer) = &self.progress {
            observer(&progress);
        }
    }
}

fn cancelled(state: &RunState, required: usize) -> QueueSignalWaiterError {
    QueueSignalWaiterError::Cancelled {
        received: state.received(),
        required,
        polls: state.polls,
    }
}
