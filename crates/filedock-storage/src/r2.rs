//! Cloudflare-R2-style S3 backend (variant B).
//!
//! Objects are private by default; no ACL is applied at put time. The public
//! URL uses the configured public domain when one exists, else the
//! synthesized `{bucket}.{account}.r2.cloudflarestorage.com` form — but for
//! buckets without a public domain, `signed_url` is the only sanctioned read
//! path.

use crate::resolve::resolve_s3_key;
use crate::traits::{ObjectStorage, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use bytes::Bytes;
use filedock_core::config::R2Config;
use filedock_core::models::{StorageBackendKind, StorageObjectRef};
use std::time::Duration;

/// R2 storage adapter
#[derive(Clone)]
pub struct R2Storage {
    client: Client,
    bucket: String,
    account_id: String,
    public_url: Option<String>,
}

impl R2Storage {
    pub fn new(config: &R2Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "r2",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint())
            // R2's S3 API region is always "auto".
            .region(Region::new("auto"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        R2Storage {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            account_id: config.account_id.clone(),
            public_url: config
                .public_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        match &self.public_url {
            Some(domain) => format!("{}/{}", domain, key),
            None => format!(
                "https://{}.{}.r2.cloudflarestorage.com/{}",
                self.bucket, self.account_id, key
            ),
        }
    }
}

#[async_trait]
impl ObjectStorage for R2Storage {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StorageObjectRef> {
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(Bytes::from(data)))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "R2 upload failed"
                );
                StorageError::UploadFailed(format!("{}", DisplayErrorContext(&e)))
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "R2 upload successful"
        );

        Ok(StorageObjectRef {
            url: self.public_url(key),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    key = %key,
                    "R2 delete failed"
                );
                StorageError::DeleteFailed(format!("{}", DisplayErrorContext(&e)))
            })?;

        tracing::info!(bucket = %self.bucket, key = %key, "R2 delete successful");
        Ok(())
    }

    async fn delete_batch(&self, keys: &[String]) -> StorageResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        self.client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    key_count = keys.len(),
                    "R2 batch delete failed"
                );
                StorageError::DeleteFailed(format!("{}", DisplayErrorContext(&e)))
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key_count = keys.len(),
            "R2 batch delete successful"
        );

        Ok(())
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::SignFailed(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::SignFailed(format!("{}", DisplayErrorContext(&e))))?;

        Ok(request.uri().to_string())
    }

    fn resolve_key(&self, url: &str) -> Option<String> {
        resolve_s3_key(url, &self.bucket, self.public_url.as_deref())
    }

    fn backend_kind(&self) -> StorageBackendKind {
        StorageBackendKind::R2
    }
}
