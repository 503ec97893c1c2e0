//! Startup checks. Any failure here aborts before a single job is queued.

use bucketmove_core::store::ObjectStore;
use eyre::{bail, eyre, Result};

const DEFAULT_REGION: &str = "us-east-1";

/// Confirm `bucket` is reachable; its region is logged when available.
pub async fn check_bucket(store: &dyn ObjectStore, bucket: &str, side: &str) -> Result<()> {
    if bucket.trim().is_empty() {
        bail!("{side} bucket name is empty");
    }

    store
        .probe_bucket(bucket)
        .await
        .map_err(|e| eyre!("{side} bucket '{bucket}' is not reachable: {e}"))?;

    match store.bucket_region(bucket).await {
        Ok(region) => log::info!(
            "{side} bucket '{bucket}' region: {}",
            region.as_deref().unwrap_or(DEFAULT_REGION)
        ),
        Err(err) => log::warn!("could not get {side} bucket location: {err}"),
    }
    Ok(())
}
