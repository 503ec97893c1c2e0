//! Error types for storage calls and per-object transfers.
//!
//! Two layers:
//! - `StoreError`: a single storage capability call failed (or was cancelled).
//! - `TransferError`: a job failed terminally; the variant names the sub-step.
//!
//! Run-level (fatal) failures are plain `eyre::Report`s and never use these types.

use std::fmt;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Broad class of a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The bucket or object does not exist.
    NotFound,
    /// Any other failure reported by the service or transport.
    Service,
    /// The run was cancelled while the call was in flight.
    Cancelled,
}

/// A failed storage capability call.
#[derive(Debug, Clone)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Service,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: StoreErrorKind::Cancelled,
            message: "operation cancelled".to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == StoreErrorKind::Cancelled
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StoreErrorKind::NotFound => write!(f, "not found: {}", self.message),
            StoreErrorKind::Service | StoreErrorKind::Cancelled => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Terminal failure of one object transfer.
#[derive(Debug)]
pub enum TransferError {
    /// Fetching source metadata for the streamed path failed.
    Metadata(StoreError),
    /// The object exceeds the single-request upload ceiling.
    TooLarge { size: u64, limit: u64 },
    /// Opening the source body failed.
    Read(StoreError),
    /// Uploading the stream to the destination failed.
    Write(StoreError),
    /// The run was cancelled before the job finished.
    Cancelled,
}

impl TransferError {
    /// Map a store failure into the given sub-step, keeping cancellation distinct.
    pub(crate) fn at_step(err: StoreError, step: fn(StoreError) -> TransferError) -> Self {
        if err.is_cancelled() {
            TransferError::Cancelled
        } else {
            step(err)
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Metadata(err) => write!(f, "head object error: {err}"),
            TransferError::TooLarge { size, limit } => write!(
                f,
                "file too large ({size} bytes / {:.2} GB) - exceeds {:.0} GB single PUT limit ({limit} bytes); \
                 use a multipart-capable tool such as 'aws s3 cp' for objects this size",
                *size as f64 / GIB,
                *limit as f64 / GIB,
            ),
            TransferError::Read(err) => write!(f, "get error: {err}"),
            TransferError::Write(err) => write!(f, "streaming put error: {err}"),
            TransferError::Cancelled => write!(f, "transfer cancelled"),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Metadata(err) | TransferError::Read(err) | TransferError::Write(err) => {
                Some(err)
            }
            TransferError::TooLarge { .. } | TransferError::Cancelled => None,
        }
    }
}
