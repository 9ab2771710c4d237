use crate::types::{DeleteEntry, RunResult};
use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;

/// Mutable state owned by a single run. Discarded when the run ends.
#[derive(Debug)]
pub(super) struct RunState {
    started_at: Instant,
    pub(super) deadline: Instant,
    pub(super) polls: u32,
    pub(super) signals: Vec<String>,
    /// Receipt handles read in the current poll and not yet sent for deletion.
    pub(super) pending_deletes: Vec<DeleteEntry>,
    pub(super) unacknowledged: usize,
}

impl RunState {
    pub(super) fn start(timeout: Duration) -> Self {
        let started_at = Instant::now();
        Self {
            started_at,
            deadline: started_at + timeout,
            polls: 0,
            signals: Vec::new(),
            pending_deletes: Vec::new(),
            unacknowledged: 0,
        }
    }

    pub(super) fn received(&self) -> usize {
        self.signals.len()
    }

    pub(super) fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub(super) fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub(super) fn deadline_passed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Batch ids must be unique within one request, so the provider message id
    /// is suffixed with the entry's position.
    pub(super) fn stage_delete(&mut self, message_id: Option<String>, receipt_handle: String) {
        let index = self.pending_deletes.len();
        let id = match message_id {
            Some(message_id) => format!("{message_id}-{index}"),
            None => format!("signal-{index}"),
        };
        self.pending_deletes.push(DeleteEntry { id, receipt_handle });
    }

    pub(super) fn finish(self) -> RunResult {
        let elapsed = self.elapsed();
        RunResult {
            signal_count: self.signals.len(),
            signals: self.signals,
            elapsed,
            polls: self.polls,
            completed_at: Utc::now(),
            unacknowledged: self.unacknowledged,
        }
    }
}
