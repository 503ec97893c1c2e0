//! In-memory `ObjectStore` for tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ListPage, ObjectBody, ObjectHead, ObjectStore};
use crate::errors::StoreError;

#[derive(Clone)]
struct MockObject {
    data: Vec<u8>,
    /// Size reported by HEAD when it differs from `data` (oversize fixtures).
    claimed_size: Option<u64>,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
}

#[derive(Default)]
pub(crate) struct MockStore {
    objects: Mutex<BTreeMap<(String, String), MockObject>>,
    deny_copy: Mutex<HashSet<String>>,
    fail_head: Mutex<HashSet<String>>,
    fail_get: Mutex<HashSet<String>>,
    fail_put: Mutex<HashSet<String>>,
    hang_copy: Mutex<HashSet<String>>,
    fail_list_page: Mutex<Option<usize>>,
    page_size: Mutex<Option<usize>>,
    max_latency_ms: Mutex<u64>,
    list_calls: AtomicUsize,
    copy_calls: AtomicUsize,
    get_calls: AtomicUsize,
    put_calls: AtomicUsize,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.objects.lock().insert(
            (bucket.to_string(), key.to_string()),
            MockObject {
                data,
                claimed_size: None,
                content_type: Some("application/octet-stream".to_string()),
                metadata: HashMap::from([("origin".to_string(), "fixture".to_string())]),
            },
        );
    }

    /// Insert an object whose HEAD reports `size` but which holds no bytes.
    pub(crate) fn insert_claimed(&self, bucket: &str, key: &str, size: u64) {
        self.objects.lock().insert(
            (bucket.to_string(), key.to_string()),
            MockObject {
                data: Vec::new(),
                claimed_size: Some(size),
                content_type: Some("video/mp4".to_string()),
                metadata: HashMap::new(),
            },
        );
    }

    pub(crate) fn deny_copy(&self, key: &str) {
        self.deny_copy.lock().insert(key.to_string());
    }

    pub(crate) fn deny_all_copies(&self) {
        let keys: Vec<String> = self.objects.lock().keys().map(|(_, k)| k.clone()).collect();
        self.deny_copy.lock().extend(keys);
    }

    pub(crate) fn fail_head(&self, key: &str) {
        self.fail_head.lock().insert(key.to_string());
    }

    pub(crate) fn fail_get(&self, key: &str) {
        self.fail_get.lock().insert(key.to_string());
    }

    pub(crate) fn fail_put(&self, key: &str) {
        self.fail_put.lock().insert(key.to_string());
    }

    pub(crate) fn hang_copy(&self, key: &str) {
        self.hang_copy.lock().insert(key.to_string());
    }

    pub(crate) fn fail_list_page(&self, page: usize) {
        *self.fail_list_page.lock() = Some(page);
    }

    pub(crate) fn set_page_size(&self, size: usize) {
        *self.page_size.lock() = Some(size);
    }

    pub(crate) fn set_max_latency_ms(&self, ms: u64) {
        *self.max_latency_ms.lock() = ms;
    }

    pub(crate) fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.data.clone())
    }

    pub(crate) fn object_head(&self, bucket: &str, key: &str) -> Option<ObjectHead> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| ObjectHead {
                size: o.claimed_size.unwrap_or(o.data.len() as u64),
                content_type: o.content_type.clone(),
                metadata: o.metadata.clone(),
            })
    }

    pub(crate) fn count(&self, bucket: &str) -> usize {
        self.objects.lock().keys().filter(|(b, _)| b == bucket).count()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn copy_calls(&self) -> usize {
        self.copy_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    async fn jitter(&self) {
        let max = *self.max_latency_ms.lock();
        if max > 0 {
            let ms = rand::random::<u64>() % max;
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> Result<ListPage, StoreError> {
        let page_idx = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_list_page.lock() == Some(page_idx) {
            return Err(StoreError::service(format!("page {page_idx} of '{bucket}' failed")));
        }

        let keys: Vec<String> = self
            .objects
            .lock()
            .keys()
            .filter(|(b, k)| b == bucket && prefix.is_none_or(|p| k.starts_with(p)))
            .map(|(_, k)| k.clone())
            .collect();

        let start = token
            .map(|t| t.parse::<usize>().map_err(|_| StoreError::service("bad token")))
            .transpose()?
            .unwrap_or(0);
        let page_size = self.page_size.lock().unwrap_or(usize::MAX);
        let end = start.saturating_add(page_size).min(keys.len());

        Ok(ListPage {
            keys: keys[start..end].to_vec(),
            next_token: (end < keys.len()).then(|| end.to_string()),
        })
    }

    async fn probe_bucket(&self, _bucket: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn bucket_region(&self, _bucket: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, StoreError> {
        self.jitter().await;
        if self.fail_head.lock().contains(key) {
            return Err(StoreError::service("head throttled"));
        }
        self.object_head(bucket, key)
            .ok_or_else(|| StoreError::not_found(format!("{bucket}/{key}")))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.lock().contains(key) {
            return Err(StoreError::service("connection reset"));
        }
        let data = self
            .object(bucket, key)
            .ok_or_else(|| StoreError::not_found(format!("{bucket}/{key}")))?;
        Ok(ObjectBody::from(data))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectBody,
        head: &ObjectHead,
    ) -> Result<(), StoreError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.lock().contains(key) {
            return Err(StoreError::service("access denied"));
        }
        let data = body
            .collect()
            .await
            .map_err(|e| StoreError::service(format!("body read: {e}")))?
            .into_bytes()
            .to_vec();
        if data.len() as u64 != head.size {
            return Err(StoreError::service(format!(
                "length mismatch: declared {} got {}",
                head.size,
                data.len()
            )));
        }
        self.objects.lock().insert(
            (bucket.to_string(), key.to_string()),
            MockObject {
                data,
                claimed_size: None,
                content_type: head.content_type.clone(),
                metadata: head.metadata.clone(),
            },
        );
        Ok(())
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        key: &str,
        dst_bucket: &str,
    ) -> Result<(), StoreError> {
        self.copy_calls.fetch_add(1, Ordering::SeqCst);
        self.jitter().await;
        if self.hang_copy.lock().contains(key) {
            std::future::pending::<()>().await;
        }
        if self.deny_copy.lock().contains(key) {
            return Err(StoreError::service("AccessDenied: cross-account copy"));
        }
        let mut objects = self.objects.lock();
        let object = objects
            .get(&(src_bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("{src_bucket}/{key}")))?;
        objects.insert((dst_bucket.to_string(), key.to_string()), object);
        Ok(())
    }
}
