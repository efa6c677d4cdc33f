//! Upload service
//!
//! Orchestrates the pipeline: validate → transcode → derive key → put.
//! Validation and transcoding run to completion before any backend call, so
//! a rejected or un-decodable file never touches the network. Delete and
//! sign operations accept either a raw key or a previously issued URL and
//! normalize to the canonical key first.

use std::sync::Arc;
use std::time::Duration;

use filedock_core::constants::DEFAULT_SIGNED_URL_TTL_SECS;
use filedock_core::models::{StorageObjectRef, UploadOptions, UploadedFile};
use filedock_core::AppError;
use filedock_processing::transcode::{maybe_transcode, TranscodeOutput};
use filedock_processing::validator::FileValidator;
use filedock_storage::keys::derive_key;
use filedock_storage::ObjectStorage;

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    validator: FileValidator,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>, max_file_size: usize) -> Self {
        Self {
            storage,
            validator: FileValidator::new(max_file_size),
        }
    }

    /// Validate and (conditionally) transcode a file. Pure with respect to
    /// the network; failures here abort before any backend call.
    fn prepare(&self, file: UploadedFile) -> Result<TranscodeOutput, AppError> {
        self.validator.validate(&file)?;
        let extension = file
            .extension()
            .ok_or_else(|| AppError::Validation("File has no extension".to_string()))?;
        let output = maybe_transcode(file.data, &extension, &file.content_type)?;
        Ok(output)
    }

    pub async fn upload_single(
        &self,
        file: UploadedFile,
        options: UploadOptions,
    ) -> Result<StorageObjectRef, AppError> {
        let prepared = self.prepare(file)?;
        let key = derive_key(&prepared.extension, &options);

        tracing::info!(
            key = %key,
            content_type = %prepared.content_type,
            size_bytes = prepared.data.len(),
            "Uploading file"
        );

        let reference = self
            .storage
            .put(&key, &prepared.content_type, prepared.data)
            .await?;
        Ok(reference)
    }

    /// Upload a batch of files.
    ///
    /// All files are validated and transcoded before the first backend call,
    /// so one bad file rejects the whole batch without any network I/O.
    /// Puts then fan out concurrently; if any of them fails, the objects
    /// already stored are deleted best-effort before the error propagates.
    pub async fn upload_many(
        &self,
        files: Vec<UploadedFile>,
        options: UploadOptions,
    ) -> Result<Vec<StorageObjectRef>, AppError> {
        let mut prepared = Vec::with_capacity(files.len());
        for file in files {
            prepared.push(self.prepare(file)?);
        }

        let puts = prepared.into_iter().map(|output| {
            let key = derive_key(&output.extension, &options);
            let storage = self.storage.clone();
            async move {
                storage
                    .put(&key, &output.content_type, output.data)
                    .await
            }
        });

        let results = futures::future::join_all(puts).await;

        let mut stored = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(reference) => stored.push(reference),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        if let Some(err) = first_error {
            if !stored.is_empty() {
                let keys: Vec<String> = stored.iter().map(|r| r.key.clone()).collect();
                if let Err(cleanup_err) = self.storage.delete_batch(&keys).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        key_count = keys.len(),
                        "Failed to clean up partially stored batch"
                    );
                }
            }
            return Err(err.into());
        }

        Ok(stored)
    }

    pub async fn delete(&self, key_or_url: &str) -> Result<(), AppError> {
        let key = self.normalize_key(key_or_url)?;
        self.storage.delete(&key).await?;
        Ok(())
    }

    pub async fn delete_many(&self, keys_or_urls: &[String]) -> Result<(), AppError> {
        if keys_or_urls.is_empty() {
            return Ok(());
        }
        let keys = keys_or_urls
            .iter()
            .map(|k| self.normalize_key(k))
            .collect::<Result<Vec<_>, _>>()?;
        self.storage.delete_batch(&keys).await?;
        Ok(())
    }

    pub async fn signed_url(
        &self,
        key_or_url: &str,
        expires_in_secs: Option<u64>,
    ) -> Result<String, AppError> {
        let key = self.normalize_key(key_or_url)?;
        let ttl = Duration::from_secs(expires_in_secs.unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS));
        let url = self.storage.signed_url(&key, ttl).await?;
        Ok(url)
    }

    /// Round-trip whichever form the caller has on hand back to the key.
    fn normalize_key(&self, key_or_url: &str) -> Result<String, AppError> {
        if key_or_url.starts_with("http://") || key_or_url.starts_with("https://") {
            self.storage
                .resolve_key(key_or_url)
                .ok_or_else(|| AppError::NotResolvable(key_or_url.to_string()))
        } else {
            Ok(key_or_url.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use filedock_core::models::StorageBackendKind;
    use filedock_storage::{StorageError, StorageResult};
    use std::sync::Mutex;

    const MOCK_BASE: &str = "https://mock-bucket.example.com";

    #[derive(Debug, Clone, PartialEq)]
    enum MockCall {
        Put { key: String, content_type: String },
        Delete { key: String },
        DeleteBatch { keys: Vec<String> },
        Sign { key: String, expires_secs: u64 },
    }

    /// Records backend calls; optionally fails puts for one content type to
    /// simulate partial batch failure.
    #[derive(Default)]
    struct MockStorage {
        calls: Mutex<Vec<MockCall>>,
        fail_put_content_type: Option<String>,
    }

    impl MockStorage {
        fn failing_puts_for(content_type: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_put_content_type: Some(content_type.to_string()),
            }
        }

        fn calls(&self) -> Vec<MockCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStorage for MockStorage {
        async fn put(
            &self,
            key: &str,
            content_type: &str,
            _data: Vec<u8>,
        ) -> StorageResult<StorageObjectRef> {
            if self.fail_put_content_type.as_deref() == Some(content_type) {
                return Err(StorageError::UploadFailed("simulated failure".into()));
            }
            self.calls.lock().unwrap().push(MockCall::Put {
                key: key.to_string(),
                content_type: content_type.to_string(),
            });
            Ok(StorageObjectRef {
                url: format!("{}/{}", MOCK_BASE, key),
                key: key.to_string(),
            })
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            self.calls.lock().unwrap().push(MockCall::Delete {
                key: key.to_string(),
            });
            Ok(())
        }

        async fn delete_batch(&self, keys: &[String]) -> StorageResult<()> {
            self.calls.lock().unwrap().push(MockCall::DeleteBatch {
                keys: keys.to_vec(),
            });
            Ok(())
        }

        async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
            self.calls.lock().unwrap().push(MockCall::Sign {
                key: key.to_string(),
                expires_secs: expires_in.as_secs(),
            });
            Ok(format!("{}/{}?expires={}", MOCK_BASE, key, expires_in.as_secs()))
        }

        fn resolve_key(&self, url: &str) -> Option<String> {
            url.strip_prefix(&format!("{}/", MOCK_BASE))
                .map(String::from)
        }

        fn backend_kind(&self) -> StorageBackendKind {
            StorageBackendKind::Spaces
        }
    }

    fn service_with(storage: Arc<MockStorage>) -> UploadService {
        UploadService::new(storage, 30 * 1024 * 1024)
    }

    fn png(name: &str) -> UploadedFile {
        UploadedFile::new(name.to_string(), "image/png".to_string(), vec![1u8; 64])
    }

    #[tokio::test]
    async fn upload_returns_resolvable_reference() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let reference = service
            .upload_single(png("photo.png"), UploadOptions::default())
            .await
            .unwrap();

        assert!(reference.key.starts_with("uploads/"));
        assert!(reference.key.ends_with(".png"));
        assert_eq!(
            storage.resolve_key(&reference.url).as_deref(),
            Some(reference.key.as_str())
        );

        let calls = storage.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            MockCall::Put {
                key: reference.key.clone(),
                content_type: "image/png".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn custom_folder_lands_in_key() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let reference = service
            .upload_single(
                png("photo.png"),
                UploadOptions {
                    folder: Some("avatars".into()),
                    filename: None,
                },
            )
            .await
            .unwrap();

        assert!(reference.key.starts_with("avatars/"));
    }

    #[tokio::test]
    async fn disallowed_file_never_reaches_backend() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let exe = UploadedFile::new(
            "setup.exe".into(),
            "application/octet-stream".into(),
            vec![1u8; 64],
        );
        let err = service
            .upload_single(exe, UploadOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(storage.calls().is_empty(), "no backend call expected");
    }

    #[tokio::test]
    async fn undecodable_heic_never_reaches_backend() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let heic = UploadedFile::new("photo.heic".into(), "image/heic".into(), vec![0u8; 64]);
        let err = service
            .upload_single(heic, UploadOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transcode(_)));
        assert!(storage.calls().is_empty(), "transcode failure must abort before network");
    }

    #[tokio::test]
    async fn delete_accepts_key_and_is_idempotent() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        service.delete("uploads/a.png").await.unwrap();
        service.delete("uploads/a.png").await.unwrap();

        assert_eq!(
            storage.calls(),
            vec![
                MockCall::Delete {
                    key: "uploads/a.png".into()
                };
                2
            ]
        );
    }

    #[tokio::test]
    async fn delete_accepts_previously_issued_url() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let url = format!("{}/uploads/a.png", MOCK_BASE);
        service.delete(&url).await.unwrap();

        assert_eq!(
            storage.calls(),
            vec![MockCall::Delete {
                key: "uploads/a.png".into()
            }]
        );
    }

    #[tokio::test]
    async fn foreign_url_is_not_resolvable() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let err = service
            .delete("https://elsewhere.example/uploads/a.png")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotResolvable(_)));
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_many_normalizes_mixed_input() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let input = vec![
            "uploads/a.png".to_string(),
            format!("{}/uploads/b.png", MOCK_BASE),
        ];
        service.delete_many(&input).await.unwrap();

        assert_eq!(
            storage.calls(),
            vec![MockCall::DeleteBatch {
                keys: vec!["uploads/a.png".into(), "uploads/b.png".into()]
            }]
        );
    }

    #[tokio::test]
    async fn delete_many_with_empty_set_makes_no_calls() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        service.delete_many(&[]).await.unwrap();
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn signed_url_passes_requested_ttl_through() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        service.signed_url("uploads/a.png", Some(60)).await.unwrap();
        service.signed_url("uploads/a.png", None).await.unwrap();

        assert_eq!(
            storage.calls(),
            vec![
                MockCall::Sign {
                    key: "uploads/a.png".into(),
                    expires_secs: 60
                },
                MockCall::Sign {
                    key: "uploads/a.png".into(),
                    expires_secs: 3600
                },
            ]
        );
    }

    #[tokio::test]
    async fn upload_many_stores_all_files() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let refs = service
            .upload_many(
                vec![png("a.png"), png("b.png")],
                UploadOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(refs.len(), 2);
        assert_eq!(storage.calls().len(), 2);
    }

    #[tokio::test]
    async fn upload_many_rejects_whole_batch_before_network() {
        let storage = Arc::new(MockStorage::default());
        let service = service_with(storage.clone());

        let exe = UploadedFile::new(
            "setup.exe".into(),
            "application/octet-stream".into(),
            vec![1u8; 64],
        );
        let err = service
            .upload_many(vec![png("a.png"), exe], UploadOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(storage.calls().is_empty(), "validation failure must reject the batch before any put");
    }

    #[tokio::test]
    async fn upload_many_compensates_on_partial_failure() {
        let storage = Arc::new(MockStorage::failing_puts_for("image/gif"));
        let service = service_with(storage.clone());

        let gif = UploadedFile::new("anim.gif".into(), "image/gif".into(), vec![1u8; 64]);
        let err = service
            .upload_many(vec![png("a.png"), gif], UploadOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));

        let calls = storage.calls();
        let stored_key = calls
            .iter()
            .find_map(|c| match c {
                MockCall::Put { key, .. } => Some(key.clone()),
                _ => None,
            })
            .expect("the png should have been stored");
        assert!(
            calls.contains(&MockCall::DeleteBatch {
                keys: vec![stored_key]
            }),
            "stored sibling should be cleaned up, got {:?}",
            calls
        );
    }
}
