//! Filedock Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! constants shared across all Filedock components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{CloudinaryConfig, Config, R2Config, SpacesConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{StorageBackendKind, StorageObjectRef, UploadOptions, UploadedFile};
