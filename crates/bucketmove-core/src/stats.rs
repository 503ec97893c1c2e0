//! Run-wide counters shared by every worker.
//!
//! One `parking_lot::Mutex` guards the whole struct; each mutation is a single
//! O(1) critical section so a counter bump and a method-map insert can never
//! interleave across workers.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::job::{TransferMethod, TransferOutcome};

/// Immutable view of the counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,
    pub total_jobs: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub total_bytes: u64,
    pub methods: BTreeMap<TransferMethod, u64>,
}

impl StatsSnapshot {
    pub fn completed(&self) -> u64 {
        self.success_count + self.error_count
    }

    /// Wall time between start and finalisation (zero until finalised).
    pub fn elapsed(&self) -> Duration {
        self.ended_at
            .and_then(|end| (end - self.started_at).to_std().ok())
            .unwrap_or_default()
    }
}

/// Writable until `finalize`; afterwards updates are dropped so the finalised
/// snapshot stays what the report reads.
pub struct StatsAggregator {
    inner: Mutex<StatsSnapshot>,
}

impl StatsAggregator {
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            inner: Mutex::new(StatsSnapshot {
                started_at,
                ended_at: None,
                total_jobs: 0,
                success_count: 0,
                error_count: 0,
                total_bytes: 0,
                methods: BTreeMap::new(),
            }),
        }
    }

    pub fn start_now() -> Self {
        Self::new(Local::now())
    }

    /// Set the number of jobs the listing produced.
    pub fn set_total_jobs(&self, total: u64) {
        self.inner.lock().total_jobs = total;
    }

    pub fn record_success(&self, bytes: Option<u64>, method: TransferMethod) {
        let mut stats = self.inner.lock();
        if stats.ended_at.is_some() {
            log::debug!("stats already finalised; ignoring {method} success");
            return;
        }
        stats.success_count += 1;
        stats.total_bytes = stats.total_bytes.saturating_add(bytes.unwrap_or(0));
        *stats.methods.entry(method).or_insert(0) += 1;
    }

    pub fn record_error(&self) {
        let mut stats = self.inner.lock();
        if stats.ended_at.is_some() {
            log::debug!("stats already finalised; ignoring error");
            return;
        }
        stats.error_count += 1;
    }

    /// Apply one outcome: exactly one of success/error increments.
    pub fn record(&self, outcome: &TransferOutcome) {
        match outcome.method {
            Some(method) if outcome.is_success() => self.record_success(outcome.bytes, method),
            _ => self.record_error(),
        }
    }

    /// Stamp the end time once the pool has fully drained.
    pub fn finalize(&self, ended_at: DateTime<Local>) -> StatsSnapshot {
        let mut stats = self.inner.lock();
        stats.ended_at = Some(ended_at);
        stats.clone()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().clone()
    }
}
