//! Per-object transfer strategy.
//!
//! 1. Server-side copy. Costs no local bandwidth; preferred whenever the
//!    service's permission model allows it.
//! 2. On any copy failure, stream instead: HEAD for size and metadata, refuse
//!    anything above the single-PUT ceiling, then pipe the GET body straight
//!    into the destination PUT. Nothing is buffered to local storage.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::errors::TransferError;
use crate::job::{TransferMethod, Transferred};
use crate::store::{cancellable, ObjectStore};

/// Largest object a single PUT request accepts (5 GiB).
pub const SINGLE_PUT_LIMIT: u64 = 5 * 1024 * 1024 * 1024;

const MIB: f64 = 1024.0 * 1024.0;

/// Reject objects a single PUT cannot carry.
pub fn check_size(size: u64) -> Result<(), TransferError> {
    if size > SINGLE_PUT_LIMIT {
        return Err(TransferError::TooLarge {
            size,
            limit: SINGLE_PUT_LIMIT,
        });
    }
    Ok(())
}

/// Source and destination of a run. Keys are never renamed.
pub struct TransferRoute {
    pub source: Arc<dyn ObjectStore>,
    pub destination: Arc<dyn ObjectStore>,
    pub source_bucket: String,
    pub dest_bucket: String,
}

impl TransferRoute {
    pub fn new(
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        source_bucket: impl Into<String>,
        dest_bucket: impl Into<String>,
    ) -> Self {
        Self {
            source,
            destination,
            source_bucket: source_bucket.into(),
            dest_bucket: dest_bucket.into(),
        }
    }

    /// Move one object, choosing between direct copy and streaming.
    pub async fn transfer(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Transferred, TransferError> {
        let copied = cancellable(
            cancel,
            self.source
                .copy_object(&self.source_bucket, key, &self.dest_bucket),
        )
        .await;

        match copied {
            Ok(()) => {
                log::debug!("server-side copy: {key}");
                Ok(Transferred {
                    method: TransferMethod::Direct,
                    bytes: None,
                })
            }
            Err(err) if err.is_cancelled() => Err(TransferError::Cancelled),
            Err(err) => {
                log::info!("server-side copy failed for {key} ({err}); falling back to streaming");
                self.stream(key, cancel).await
            }
        }
    }

    async fn stream(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Transferred, TransferError> {
        let head = cancellable(cancel, self.source.head_object(&self.source_bucket, key))
            .await
            .map_err(|e| TransferError::at_step(e, TransferError::Metadata))?;

        check_size(head.size)?;

        let body = cancellable(cancel, self.source.get_object(&self.source_bucket, key))
            .await
            .map_err(|e| TransferError::at_step(e, TransferError::Read))?;

        log::info!(
            "streaming {key} from {} to {} ({:.2} MB, no local storage)",
            self.source_bucket,
            self.dest_bucket,
            head.size as f64 / MIB
        );

        cancellable(
            cancel,
            self.destination
                .put_object(&self.dest_bucket, key, body, &head),
        )
        .await
        .map_err(|e| TransferError::at_step(e, TransferError::Write))?;

        log::debug!("streamed {key} ({} bytes)", head.size);
        Ok(Transferred {
            method: TransferMethod::Streamed,
            bytes: Some(head.size),
        })
    }
}
