//! Worker: background summarization off the request path.
//!
//! Callers enqueue a session id after a turn completes and never wait on the
//! result. Failures are logged and counted; a failed session is picked up
//! again the next time it is enqueued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{run_once, Summarizer, SummaryOutcome};
use crate::conf::AssemblerConfig;
use crate::store::SessionStore;

/// Counters shared between the worker and its queue handles.
#[derive(Debug, Default)]
pub struct WorkerStats {
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    consecutive_failures: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatsSnapshot {
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub consecutive_failures: u64,
    /// Requests refused because the queue was full
    pub dropped: u64,
}

impl WorkerStats {
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Sending side of the summarization queue. Cheap to clone; the worker stops
/// once every handle is dropped and the queue has drained.
#[derive(Clone)]
pub struct SummaryQueue {
    tx: mpsc::Sender<String>,
    stats: Arc<WorkerStats>,
    enabled: bool,
}

impl SummaryQueue {
    /// Queue a session for summarization without waiting. Returns false when
    /// the request was not queued.
    pub fn enqueue(&self, session_id: impl Into<String>) -> bool {
        let session_id = session_id.into();
        if !self.enabled {
            debug!(session_id = %session_id, "summarizer disabled, not queueing");
            return false;
        }

        match self.tx.try_send(session_id) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(session_id)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(session_id = %session_id, "summary queue full, dropping request");
                false
            }
            Err(mpsc::error::TrySendError::Closed(session_id)) => {
                warn!(session_id = %session_id, "summary worker stopped, dropping request");
                false
            }
        }
    }

    pub fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Counters that outlive this handle, for observing a worker after the
    /// queue is closed.
    pub fn stats_handle(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }
}

pub fn spawn_summary_worker(
    store: Arc<dyn SessionStore>,
    summarizer: Arc<dyn Summarizer>,
    config: AssemblerConfig,
) -> (SummaryQueue, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(config.summarizer.queue_capacity);
    let stats = Arc::new(WorkerStats::default());
    let queue = SummaryQueue {
        tx,
        stats: Arc::clone(&stats),
        enabled: config.summarizer.enabled,
    };

    let handle = tokio::spawn(summary_worker(store, summarizer, config, rx, stats));
    (queue, handle)
}

async fn summary_worker(
    store: Arc<dyn SessionStore>,
    summarizer: Arc<dyn Summarizer>,
    config: AssemblerConfig,
    mut rx: mpsc::Receiver<String>,
    stats: Arc<WorkerStats>,
) {
    info!(
        queue_capacity = config.summarizer.queue_capacity,
        timeout_secs = config.summarizer.timeout_secs,
        "Starting summarization worker"
    );

    while let Some(session_id) = rx.recv().await {
        match run_once(store.as_ref(), summarizer.as_ref(), &session_id, &config).await {
            Ok(SummaryOutcome::Summarized { .. }) => {
                stats.completed.fetch_add(1, Ordering::Relaxed);
                stats.consecutive_failures.store(0, Ordering::Relaxed);
            }
            Ok(SummaryOutcome::Skipped(_)) => {
                stats.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Ok(SummaryOutcome::SessionNotFound) => {
                debug!(session_id = %session_id, "session gone before summarization");
                stats.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                let consecutive = stats.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                error!(session_id = %session_id, attempt = consecutive, error = %e, "summarization failed");

                if consecutive >= 3 {
                    warn!("Summarization has failed {} times consecutively - check the model backend", consecutive);
                }
            }
        }
    }

    info!("Summarization worker stopped");
}
