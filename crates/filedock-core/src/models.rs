//! Domain models
//!
//! Transient value objects for the upload pipeline. Nothing here is
//! persisted outside the backend store itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A file extracted from an incoming request, exclusively owned by that
/// request for its lifetime.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(original_name: String, content_type: String, data: Vec<u8>) -> Self {
        Self {
            original_name,
            content_type,
            data,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Lowercased extension of the original filename, without the dot.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// Upload configuration supplied by the caller. Pure configuration, no identity.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Target folder; defaults to `uploads` when absent.
    pub folder: Option<String>,
    /// Filename used verbatim when supplied (last-write-wins at the backend);
    /// a uuid-v4 name is generated otherwise.
    pub filename: Option<String>,
}

/// Durable reference to a stored object.
///
/// `key` is the canonical internal identifier (`folder/filename`). `url` is
/// backend-specific: S3-style backends embed the key recoverably, the CDN
/// backend returns a provider URL that must be stored verbatim. Both fields
/// resolve to the same underlying object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObjectRef {
    pub url: String,
    pub key: String,
}

/// Which storage backend a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// DigitalOcean-Spaces-style S3: public-read objects, endpoint-based URLs.
    Spaces,
    /// Cloudflare-R2-style S3: private by default, optional public domain.
    R2,
    /// Cloudinary-style media CDN: public-ID addressing, provider URLs.
    Cloudinary,
}

impl FromStr for StorageBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spaces" | "digitalocean" => Ok(StorageBackendKind::Spaces),
            "r2" | "cloudflare" => Ok(StorageBackendKind::R2),
            "cloudinary" => Ok(StorageBackendKind::Cloudinary),
            other => Err(format!(
                "Unknown storage backend '{}' (expected spaces, r2, or cloudinary)",
                other
            )),
        }
    }
}

impl fmt::Display for StorageBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackendKind::Spaces => write!(f, "spaces"),
            StorageBackendKind::R2 => write!(f, "r2"),
            StorageBackendKind::Cloudinary => write!(f, "cloudinary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        let file = UploadedFile::new("Photo.HEIC".into(), "image/heic".into(), vec![1]);
        assert_eq!(file.extension().as_deref(), Some("heic"));
    }

    #[test]
    fn extension_missing() {
        let file = UploadedFile::new("README".into(), "text/plain".into(), vec![1]);
        assert_eq!(file.extension(), None);
    }

    #[test]
    fn backend_kind_from_str() {
        assert_eq!(
            "R2".parse::<StorageBackendKind>().unwrap(),
            StorageBackendKind::R2
        );
        assert_eq!(
            "cloudinary".parse::<StorageBackendKind>().unwrap(),
            StorageBackendKind::Cloudinary
        );
        assert!("gcs".parse::<StorageBackendKind>().is_err());
    }
}
