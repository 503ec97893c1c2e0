use std::fmt;

use crate::errors::TransferError;

/// One object key to move. Consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub key: String,
}

impl Job {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// How a successful transfer was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferMethod {
    /// Server-side copy inside the storage service.
    Direct,
    /// Source body piped through this process into a destination PUT.
    Streamed,
}

impl TransferMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferMethod::Direct => "direct",
            TransferMethod::Streamed => "streamed",
        }
    }
}

impl fmt::Display for TransferMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Error => "error",
        }
    }
}

/// What the strategy reports back for a successful job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transferred {
    pub method: TransferMethod,
    /// Known only on the streamed path.
    pub bytes: Option<u64>,
}

/// Recorded result of one job attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub key: String,
    pub status: OutcomeStatus,
    pub message: String,
    pub method: Option<TransferMethod>,
    pub bytes: Option<u64>,
}

impl TransferOutcome {
    pub fn from_result(key: String, result: &Result<Transferred, TransferError>) -> Self {
        match result {
            Ok(done) => Self {
                key,
                status: OutcomeStatus::Success,
                message: format!("moved ({})", done.method),
                method: Some(done.method),
                bytes: done.bytes,
            },
            Err(err) => Self {
                key,
                status: OutcomeStatus::Error,
                message: err.to_string(),
                method: None,
                bytes: None,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
