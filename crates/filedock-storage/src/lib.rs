//! Filedock Storage Library
//!
//! This crate provides the object-storage abstraction and the three backend
//! adapters: DigitalOcean-Spaces-style S3, Cloudflare-R2-style S3, and a
//! Cloudinary-style media CDN.
//!
//! # Storage key format
//!
//! Storage keys have the form `{folder}/{filename}` (folder defaults to
//! `uploads`). Keys are the canonical internal identifier; every backend's
//! `resolve_key` maps a previously issued URL back to the key it was written
//! under. Key derivation is centralized in the `keys` module so all backends
//! stay consistent.

#[cfg(feature = "storage-cloudinary")]
pub mod cloudinary;
pub mod factory;
pub mod keys;
pub mod resolve;
#[cfg(feature = "storage-s3")]
pub mod r2;
#[cfg(feature = "storage-s3")]
pub mod spaces;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-cloudinary")]
pub use cloudinary::CloudinaryStorage;
pub use factory::create_storage;
pub use filedock_core::StorageBackendKind;
pub use keys::derive_key;
#[cfg(feature = "storage-s3")]
pub use r2::R2Storage;
#[cfg(feature = "storage-s3")]
pub use spaces::SpacesStorage;
pub use traits::{ObjectStorage, StorageError, StorageResult};
