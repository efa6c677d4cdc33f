//! Storage abstraction trait
//!
//! This module defines the `ObjectStorage` trait that all storage backends
//! must implement, replacing per-provider modules with one polymorphic seam
//! selected by configuration at startup.

use async_trait::async_trait;
use filedock_core::models::{StorageBackendKind, StorageObjectRef};
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Signing failed: {0}")]
    SignFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for filedock_core::AppError {
    fn from(err: StorageError) -> Self {
        filedock_core::AppError::Storage(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Implemented once per backend variant. The adapter layer never retries: a
/// failed call surfaces immediately with the backend's own diagnostics
/// wrapped in a [`StorageError`]. Adapters are constructed once at startup
/// and are read-only afterwards, so a single instance is safe to share
/// across concurrent requests.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key` and return the durable object reference.
    ///
    /// Idempotent under key reuse: writing the same key again overwrites.
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StorageObjectRef>;

    /// Ensure `key` is absent. Deleting a key that does not exist is not an
    /// error; no "not found" distinction is surfaced.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Delete a set of keys in a single backend request.
    ///
    /// Returns immediately without any network call when `keys` is empty.
    /// Partial failure inside the batch is not attributed per key; the whole
    /// batch surfaces as one aggregate error.
    async fn delete_batch(&self, keys: &[String]) -> StorageResult<()>;

    /// Generate a time-limited access URL for `key`.
    ///
    /// The TTL is advisory to the backend's own signing mechanism; expiry is
    /// enforced by the backend, not by this layer.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Recover the backend-internal key from a previously issued URL.
    ///
    /// Pure parsing, no network. `None` when the URL does not belong to this
    /// backend's address space.
    fn resolve_key(&self, url: &str) -> Option<String>;

    /// Which backend variant this adapter talks to.
    fn backend_kind(&self) -> StorageBackendKind;
}
