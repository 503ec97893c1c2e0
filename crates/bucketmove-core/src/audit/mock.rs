//! Recording sink for tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use eyre::{bail, Result};
use parking_lot::Mutex;

use super::{AuditRecord, AuditSink};

#[derive(Default)]
pub(crate) struct RecordingSink {
    records: Mutex<Vec<AuditRecord>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every append fails (after being counted as attempted).
    pub(crate) fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failing: AtomicBool::new(true),
        }
    }

    pub(crate) fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        if self.failing.load(Ordering::SeqCst) {
            bail!("audit store unavailable");
        }
        Ok(())
    }
}
