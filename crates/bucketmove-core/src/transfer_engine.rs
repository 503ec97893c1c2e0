//! Fixed-size worker pool draining one bounded job queue.
//!
//! The producer pushes every listed key into the queue and closes it; workers
//! pull from the shared receiver until it is drained (or the run is cancelled).
//! `run` returns only after every worker has exited.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use eyre::{eyre, Result};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditRecord, AuditSink};
use crate::job::{Job, TransferOutcome};
use crate::stats::StatsAggregator;
use crate::transfer::TransferRoute;

/// Workers used for batches below `LARGE_BATCH_THRESHOLD`.
pub const SMALL_POOL: usize = 25;
/// Workers used for batches of `LARGE_BATCH_THRESHOLD` keys or more.
pub const LARGE_POOL: usize = 150;
pub const LARGE_BATCH_THRESHOLD: usize = 1000;
/// Bound on queued-but-unclaimed jobs.
pub const QUEUE_CAPACITY: usize = 1000;

/// Static two-tier sizing, decided once from the listing total.
pub fn pool_size(total_jobs: usize) -> usize {
    if total_jobs >= LARGE_BATCH_THRESHOLD {
        LARGE_POOL
    } else {
        SMALL_POOL
    }
}

pub struct WorkerParams {
    pub idx: usize,
    pub rx_shared: Arc<Mutex<mpsc::Receiver<Job>>>,
    pub route: Arc<TransferRoute>,
    pub stats: Arc<StatsAggregator>,
    pub sink: Arc<dyn AuditSink>,
    pub cancel: CancellationToken,
}

pub struct TransferEngine {
    route: Arc<TransferRoute>,
    stats: Arc<StatsAggregator>,
    sink: Arc<dyn AuditSink>,
}

impl TransferEngine {
    pub fn new(
        route: Arc<TransferRoute>,
        stats: Arc<StatsAggregator>,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self { route, stats, sink }
    }

    /// Move every key with a pool sized by `pool_size`. Returns the worker
    /// count used (zero for an empty key set, which skips the pool).
    ///
    /// The key count is recorded as the run total before any job starts.
    pub async fn run(&self, keys: Vec<String>, cancel: &CancellationToken) -> Result<usize> {
        self.stats.set_total_jobs(keys.len() as u64);
        if keys.is_empty() {
            return Ok(0);
        }
        let workers = pool_size(keys.len());
        log::info!("starting {workers} workers for {} files", keys.len());
        self.run_with_workers(keys, workers, cancel).await?;
        Ok(workers)
    }

    /// Drain `keys` through exactly `workers` workers.
    pub async fn run_with_workers(
        &self,
        keys: Vec<String>,
        workers: usize,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.stats.set_total_jobs(keys.len() as u64);
        let capacity = QUEUE_CAPACITY.min(keys.len()).max(1);
        let (tx, rx) = mpsc::channel::<Job>(capacity);
        let rx_shared = Arc::new(Mutex::new(rx));

        let handles: Vec<JoinHandle<()>> = (0..workers.max(1))
            .map(|idx| {
                let params = WorkerParams {
                    idx,
                    rx_shared: Arc::clone(&rx_shared),
                    route: Arc::clone(&self.route),
                    stats: Arc::clone(&self.stats),
                    sink: Arc::clone(&self.sink),
                    cancel: cancel.clone(),
                };
                tokio::spawn(worker_loop(params))
            })
            .collect();

        for key in keys {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::warn!("run cancelled; no further jobs will be queued");
                    break;
                }
                sent = tx.send(Job::new(key)) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        drop(tx);

        // Barrier: every worker must exit before the caller finalises stats.
        let mut panics = Vec::new();
        for handle in handles {
            if let Err(err) = handle.await {
                panics.push(err.to_string());
            }
        }

        if !panics.is_empty() {
            return Err(eyre!(
                "{} worker(s) failed: {}",
                panics.len(),
                panics.join("; ")
            ));
        }
        Ok(())
    }
}

async fn worker_loop(params: WorkerParams) {
    let WorkerParams {
        idx,
        rx_shared,
        route,
        stats,
        sink,
        cancel,
    } = params;

    loop {
        let job = {
            let mut rx = rx_shared.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                job = rx.recv() => job,
            }
        };
        let Some(Job { key }) = job else { break };

        let started = Instant::now();
        let result = route.transfer(&key, &cancel).await;
        let outcome = TransferOutcome::from_result(key, &result);
        stats.record(&outcome);

        if let Err(err) = &result {
            log::warn!(
                "[w{idx}] failed: {} (took {:?}) - {err}",
                outcome.key,
                started.elapsed()
            );
        }

        let record = AuditRecord::from_outcome(&outcome, Utc::now());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::warn!("audit record for {} skipped: run cancelled", outcome.key);
            }
            appended = sink.append(&record) => {
                if let Err(err) = appended {
                    log::warn!("audit insert failed for key {}: {err:#}", outcome.key);
                }
            }
        }
    }
}
