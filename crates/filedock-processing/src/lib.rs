//! Filedock Processing Library
//!
//! File validation and conditional format transcoding. Both steps are pure
//! with respect to the network: they run to completion (or fail) before any
//! storage backend is contacted.

pub mod transcode;
pub mod validator;

// Re-export commonly used types
pub use transcode::{maybe_transcode, needs_transcode, TranscodeError, TranscodeOutput};
pub use validator::{FileValidator, ValidationError};
