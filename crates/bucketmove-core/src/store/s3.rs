//! `ObjectStore` backed by the AWS SDK. Works against S3 and S3-compatible
//! services (custom endpoint + path-style addressing).

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{MetadataDirective, StorageClass};
use aws_sdk_s3::Client;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::{ListPage, ObjectBody, ObjectHead, ObjectStore};
use crate::errors::StoreError;

/// Characters left untouched in a `CopySource` header value.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Connection settings for one side of the transfer.
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Build a client from explicit settings. Static credentials are used when
    /// both halves are present; otherwise the default provider chain applies.
    pub async fn connect(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        if let (Some(key), Some(secret)) = (&settings.access_key_id, &settings.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key.clone(),
                secret.clone(),
                None,
                None,
                "bucketmove-static",
            ));
        }
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(settings.force_path_style)
            .build();

        Self {
            client: Client::from_conf(config),
        }
    }
}

fn service_error<E>(context: &str, err: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::service(format!("{context}: {}", DisplayErrorContext(err)))
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> Result<ListPage, StoreError> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_continuation_token(token)
            .send()
            .await
            .map_err(|e| service_error(&format!("list objects in '{bucket}'"), e))?;

        let keys = resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect();

        let next_token = if resp.is_truncated().unwrap_or(false) {
            match resp.next_continuation_token() {
                Some(token) => Some(token.to_string()),
                None => {
                    return Err(StoreError::service(format!(
                        "listing of '{bucket}' is truncated but carries no continuation token"
                    )))
                }
            }
        } else {
            None
        };

        Ok(ListPage { keys, next_token })
    }

    async fn probe_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| service_error(&format!("bucket access test for '{bucket}'"), e))?;
        Ok(())
    }

    async fn bucket_region(&self, bucket: &str) -> Result<Option<String>, StoreError> {
        let resp = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| service_error(&format!("bucket location for '{bucket}'"), e))?;

        Ok(resp
            .location_constraint()
            .map(|c| c.as_str().to_string())
            .filter(|c| !c.is_empty()))
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, StoreError> {
        let resp = match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    return Err(StoreError::not_found(format!("{bucket}/{key}")));
                }
                return Err(service_error(&format!("head {bucket}/{key}"), err));
            }
        };

        let size = resp
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .ok_or_else(|| {
                StoreError::service(format!("head {bucket}/{key}: no usable content length"))
            })?;

        Ok(ObjectHead {
            size,
            content_type: resp.content_type().map(str::to_string),
            metadata: resp.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| service_error(&format!("get {bucket}/{key}"), e))?;
        Ok(resp.body)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectBody,
        head: &ObjectHead,
    ) -> Result<(), StoreError> {
        let length = i64::try_from(head.size)
            .map_err(|_| StoreError::service(format!("put {bucket}/{key}: length overflow")))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_length(length)
            .set_content_type(head.content_type.clone())
            .set_metadata(Some(head.metadata.clone()))
            .send()
            .await
            .map_err(|e| service_error(&format!("put {bucket}/{key}"), e))?;
        Ok(())
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        key: &str,
        dst_bucket: &str,
    ) -> Result<(), StoreError> {
        let source = format!("{src_bucket}/{}", utf8_percent_encode(key, COPY_SOURCE));

        self.client
            .copy_object()
            .copy_source(source)
            .bucket(dst_bucket)
            .key(key)
            .metadata_directive(MetadataDirective::Copy)
            .storage_class(StorageClass::Standard)
            .send()
            .await
            .map_err(|e| service_error(&format!("copy {src_bucket}/{key} -> {dst_bucket}"), e))?;
        Ok(())
    }
}
