//! Storage backend construction.
//!
//! Adapters are built explicitly from configuration at startup and injected
//! as `Arc<dyn ObjectStorage>`; there are no module-level client singletons.

#[cfg(feature = "storage-cloudinary")]
use crate::CloudinaryStorage;
#[cfg(feature = "storage-s3")]
use crate::{R2Storage, SpacesStorage};
use crate::{ObjectStorage, StorageBackendKind, StorageError, StorageResult};
use filedock_core::Config;
use std::sync::Arc;

/// Create the storage backend selected by configuration.
pub fn create_storage(config: &Config) -> StorageResult<Arc<dyn ObjectStorage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackendKind::Spaces => {
            let spaces = config.spaces.as_ref().ok_or_else(|| {
                StorageError::ConfigError("Spaces backend selected but not configured".to_string())
            })?;
            Ok(Arc::new(SpacesStorage::new(spaces)))
        }

        #[cfg(feature = "storage-s3")]
        StorageBackendKind::R2 => {
            let r2 = config.r2.as_ref().ok_or_else(|| {
                StorageError::ConfigError("R2 backend selected but not configured".to_string())
            })?;
            Ok(Arc::new(R2Storage::new(r2)))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackendKind::Spaces | StorageBackendKind::R2 => Err(StorageError::ConfigError(
            "S3 storage backends not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-cloudinary")]
        StorageBackendKind::Cloudinary => {
            let cloudinary = config.cloudinary.as_ref().ok_or_else(|| {
                StorageError::ConfigError(
                    "Cloudinary backend selected but not configured".to_string(),
                )
            })?;
            Ok(Arc::new(CloudinaryStorage::new(cloudinary)))
        }

        #[cfg(not(feature = "storage-cloudinary"))]
        StorageBackendKind::Cloudinary => Err(StorageError::ConfigError(
            "Cloudinary backend not available (storage-cloudinary feature not enabled)".to_string(),
        )),
    }
}
