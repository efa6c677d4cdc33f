//! Upload validation
//!
//! Accepts or rejects an incoming file from its declared extension and MIME
//! type before any network call is made. Two independent checks must both
//! pass: the extension must be in the allow-set, and the MIME type must
//! either match the allow-set, be one of the HEIC/HEIF media types, or be
//! the generic octet-stream type paired with a heic/heif extension (browsers
//! and OSes commonly mislabel HEIC uploads that way).

use filedock_core::constants::{ALLOWED_EXTENSIONS, HEIC_MIME_TYPES, OCTET_STREAM};
use filedock_core::models::UploadedFile;
use filedock_core::AppError;

/// Validation errors for uploaded files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Only images (jpeg, jpg, png, gif, webp, heic, heif), PDFs, and DOC/DOCX files are allowed (got extension {extension:?}, content type {content_type:?})")]
    DisallowedType {
        extension: Option<String>,
        content_type: String,
    },

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// Upload file validator
///
/// Pure inspection of the declared extension and MIME type; no side effects.
pub struct FileValidator {
    max_file_size: usize,
}

impl FileValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    /// Validate size, extension, and MIME type of an uploaded file.
    pub fn validate(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        self.validate_size(file.size_bytes())?;
        self.validate_type(file)
    }

    /// Validate file size independently of the type checks.
    pub fn validate_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Extension and MIME conjunction. Both checks must pass; any failure
    /// rejects with a single error listing the allowed set.
    pub fn validate_type(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        let extension = file.extension();
        let content_type = file.content_type.to_lowercase();

        let extension_ok = extension
            .as_deref()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext));

        let is_heic_mime = HEIC_MIME_TYPES.contains(&content_type.as_str());
        let is_heic_extension = matches!(extension.as_deref(), Some("heic") | Some("heif"));
        let mime_ok = ALLOWED_EXTENSIONS.iter().any(|t| content_type.contains(t))
            || is_heic_mime
            || (content_type == OCTET_STREAM && is_heic_extension);

        if extension_ok && mime_ok {
            Ok(())
        } else {
            Err(ValidationError::DisallowedType {
                extension,
                content_type: file.content_type.clone(),
            })
        }
    }
}
