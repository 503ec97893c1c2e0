//! Storage capability consumed by the lister and the transfer strategy.
//!
//! The engine only ever talks to `dyn ObjectStore`; `S3Store` is the production
//! implementation and tests substitute an in-memory store.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::StoreError;

#[cfg(test)]
pub(crate) mod mock;
pub mod s3;

pub use s3::{S3Settings, S3Store};

/// Streaming object body. Handed from `get_object` to `put_object` untouched.
pub type ObjectBody = aws_sdk_s3::primitives::ByteStream;

/// One page of a bucket listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Continuation token for the next page; `None` when the listing is complete.
    pub next_token: Option<String>,
}

/// Metadata learned from a HEAD request, forwarded verbatim on upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: u64,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Object storage operations needed to move a bucket.
///
/// Implementations must be safe for concurrent use by every worker.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one listing page.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> Result<ListPage, StoreError>;

    /// Cheap reachability check (a one-key listing).
    async fn probe_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Region the bucket lives in, if the service reports one.
    async fn bucket_region(&self, bucket: &str) -> Result<Option<String>, StoreError>;

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, StoreError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectBody,
        head: &ObjectHead,
    ) -> Result<(), StoreError>;

    /// Server-side copy of `src_bucket/key` to `dst_bucket/key`, metadata preserved.
    async fn copy_object(&self, src_bucket: &str, key: &str, dst_bucket: &str)
        -> Result<(), StoreError>;
}

/// Race a storage call against run cancellation.
pub async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::cancelled()),
        res = call => res,
    }
}
