//! DigitalOcean-Spaces-style S3 backend (variant A).
//!
//! Virtual-hosted addressing, objects written with a `public-read` canned
//! ACL, public URLs of the form `{endpoint}/{bucket}/{key}`.

use crate::resolve::resolve_s3_key;
use crate::traits::{ObjectStorage, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectCannedAcl, ObjectIdentifier};
use aws_sdk_s3::Client;
use bytes::Bytes;
use filedock_core::config::SpacesConfig;
use filedock_core::models::{StorageBackendKind, StorageObjectRef};
use std::time::Duration;

/// Spaces storage adapter
#[derive(Clone)]
pub struct SpacesStorage {
    client: Client,
    bucket: String,
    endpoint: String,
}

impl SpacesStorage {
    pub fn new(config: &SpacesConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "spaces",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            // Variant A serves virtual-hosted buckets; path style stays off.
            .force_path_style(false)
            .build();

        SpacesStorage {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

#[async_trait]
impl ObjectStorage for SpacesStorage {
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
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Spaces upload failed"
                );
                StorageError::UploadFailed(format!("{}", DisplayErrorContext(&e)))
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Spaces upload successful"
        );

        Ok(StorageObjectRef {
            url: self.public_url(key),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();

        // S3 DeleteObject succeeds for missing keys, which gives the
        // "ensure absent" contract for free.
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
                    "Spaces delete failed"
                );
                StorageError::DeleteFailed(format!("{}", DisplayErrorContext(&e)))
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Spaces delete successful"
        );

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
                    "Spaces batch delete failed"
                );
                StorageError::DeleteFailed(format!("{}", DisplayErrorContext(&e)))
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key_count = keys.len(),
            "Spaces batch delete successful"
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
        resolve_s3_key(url, &self.bucket, None)
    }

    fn backend_kind(&self) -> StorageBackendKind {
        StorageBackendKind::Spaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SpacesStorage {
        SpacesStorage::new(&SpacesConfig {
            endpoint: "https://nyc3.digitaloceanspaces.com".into(),
            region: "nyc3".into(),
            bucket: "my-bucket".into(),
            access_key_id: "test-key".into(),
            secret_access_key: "test-secret".into(),
        })
    }

    #[test]
    fn public_url_is_path_style_under_endpoint() {
        assert_eq!(
            storage().public_url("uploads/a.png"),
            "https://nyc3.digitaloceanspaces.com/my-bucket/uploads/a.png"
        );
    }

    #[test]
    fn put_url_round_trips_through_resolver() {
        let storage = storage();
        let url = storage.public_url("uploads/a.png");
        assert_eq!(storage.resolve_key(&url).as_deref(), Some("uploads/a.png"));
    }
}
