//! In-process enrichment queue
//!
//! The queue hands jobs from the caller to a dispatcher task:
//! - [`EnrichmentQueue::enqueue`] returns as soon as the job is buffered
//! - The dispatcher spawns one retry cycle per job, so a slow or failing URL
//!   never delays another bookmark
//! - [`WorkerHandle::wait`] stops intake and waits for every accepted job
//!
//! ```text
//! enqueue ──► mpsc ──► dispatcher ──► JoinSet
//!                                      ├─► RetryScheduler::run (bookmark A)
//!                                      └─► RetryScheduler::run (bookmark B)
//! ```

use crate::enrich::scheduler::RetryScheduler;
use crate::state::AttemptState;
use crate::storage::StorageError;
use crate::{Result, ShioriError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use uuid::Uuid;

/// Request to enrich one bookmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentJob {
    pub bookmark_id: Uuid,
    pub url: String,
}

/// Sending side of the queue; cheap to clone
#[derive(Debug, Clone)]
pub struct EnrichmentQueue {
    tx: mpsc::UnboundedSender<EnrichmentJob>,
}

impl EnrichmentQueue {
    /// Schedules a new retry cycle for the bookmark
    ///
    /// Returns immediately. Fails only once the worker has shut down.
    pub fn enqueue(&self, bookmark_id: Uuid, url: impl Into<String>) -> Result<()> {
        let job = EnrichmentJob {
            bookmark_id,
            url: url.into(),
        };

        self.tx.send(job).map_err(|_| ShioriError::QueueClosed)?;
        tracing::debug!(%bookmark_id, "Enrichment job queued");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Counters for a finished worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub dispatched: usize,
    pub succeeded: usize,
    pub exhausted: usize,
    pub errored: usize,
}

/// Owner side of a running worker
pub struct WorkerHandle {
    shutdown: oneshot::Sender<()>,
    dispatcher: JoinHandle<WorkerStats>,
}

impl WorkerHandle {
    /// Closes the queue and waits until every accepted job has finished
    ///
    /// Jobs already buffered when this is called still run to completion;
    /// later `enqueue` calls fail with [`ShioriError::QueueClosed`].
    pub async fn wait(self) -> Result<WorkerStats> {
        // The dispatcher only exits after it sees this, so a send error means it panicked
        let _ = self.shutdown.send(());
        Ok(self.dispatcher.await?)
    }
}

/// Starts the dispatcher on the current runtime
pub fn start(scheduler: RetryScheduler) -> (EnrichmentQueue, WorkerHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let dispatcher = tokio::spawn(dispatch(scheduler, rx, shutdown_rx));

    (
        EnrichmentQueue { tx },
        WorkerHandle {
            shutdown: shutdown_tx,
            dispatcher,
        },
    )
}

type JobResult = (Uuid, std::result::Result<AttemptState, StorageError>);

async fn dispatch(
    scheduler: RetryScheduler,
    mut rx: mpsc::UnboundedReceiver<EnrichmentJob>,
    mut shutdown: oneshot::Receiver<()>,
) -> WorkerStats {
    let mut tasks: JoinSet<JobResult> = JoinSet::new();
    let mut stats = WorkerStats::default();
    let mut shutdown_seen = false;

    tracing::debug!("Enrichment worker started");

    loop {
        tokio::select! {
            signal = &mut shutdown, if !shutdown_seen => {
                shutdown_seen = true;
                // A dropped handle detaches the worker instead of stopping it
                if signal.is_ok() {
                    tracing::debug!(in_flight = tasks.len(), "Enrichment queue closing");
                    rx.close();
                }
            }

            job = rx.recv() => match job {
                Some(job) => {
                    stats.dispatched += 1;
                    let scheduler = scheduler.clone();
                    tasks.spawn(async move {
                        let result = scheduler.run(job.bookmark_id, job.url).await;
                        (job.bookmark_id, result)
                    });
                }
                None => break,
            },

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                record(&mut stats, joined);
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        record(&mut stats, joined);
    }

    tracing::debug!(
        dispatched = stats.dispatched,
        succeeded = stats.succeeded,
        exhausted = stats.exhausted,
        errored = stats.errored,
        "Enrichment worker stopped"
    );

    stats
}

fn record(stats: &mut WorkerStats, joined: std::result::Result<JobResult, JoinError>) {
    match joined {
        Ok((_, Ok(AttemptState::Succeeded))) => stats.succeeded += 1,
        Ok((_, Ok(AttemptState::ExhaustedFailure))) => stats.exhausted += 1,
        Ok((bookmark_id, Ok(state))) => {
            // Cycles only return terminal states
            tracing::warn!(%bookmark_id, %state, "Enrichment cycle ended in a non-terminal state");
            stats.errored += 1;
        }
        Ok((bookmark_id, Err(e))) => {
            tracing::error!(%bookmark_id, error = %e, "Failed to record enrichment outcome");
            stats.errored += 1;
        }
        Err(e) => {
            tracing::error!(error = %e, "Enrichment task aborted");
            stats.errored += 1;
        }
    }
}
