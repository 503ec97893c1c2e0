//! Source bucket enumeration.
//!
//! The full key set is collected before any worker starts: pool sizing depends
//! on the total, and a partial listing would silently drop objects, so any page
//! failure aborts the run.

use eyre::{eyre, Result};
use tokio_util::sync::CancellationToken;

use crate::store::{cancellable, ObjectStore};

/// List every key in `bucket` (optionally under `prefix`), following
/// continuation tokens until the service reports none.
pub async fn list_keys(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    let prefix = prefix.filter(|p| !p.is_empty());
    if let Some(p) = prefix {
        log::info!("filtering '{bucket}' with prefix: {p}");
    }

    let mut keys = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = cancellable(cancel, store.list_page(bucket, prefix, token.take()))
            .await
            .map_err(|e| eyre!("unable to list objects in '{bucket}' (page {}): {e}", pages + 1))?;
        pages += 1;
        keys.extend(page.keys);

        match page.next_token {
            Some(next) => {
                log::debug!("listed page {pages} of '{bucket}' ({} keys so far)", keys.len());
                token = Some(next);
            }
            None => break,
        }
    }

    log::debug!("listing of '{bucket}' complete: {} keys in {pages} page(s)", keys.len());
    Ok(keys)
}
