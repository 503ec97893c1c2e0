//! Append-only audit trail: one record per transfer attempt.
//!
//! Appends are best-effort. The worker logs a failed append and moves on; the
//! job's outcome is never affected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;

#[cfg(test)]
pub(crate) mod mock;
pub mod mysql;

pub use mysql::MySqlAuditSink;

use crate::job::{OutcomeStatus, TransferOutcome};

/// One audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub key: String,
    pub status: OutcomeStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_outcome(outcome: &TransferOutcome, timestamp: DateTime<Utc>) -> Self {
        Self {
            key: outcome.key.clone(),
            status: outcome.status,
            message: outcome.message.clone(),
            timestamp,
        }
    }
}

/// Destination for audit records. Must be safe to share across workers.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<()>;
}
