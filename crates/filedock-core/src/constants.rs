//! Shared constants

/// Folder objects land in when the caller does not supply one.
pub const DEFAULT_FOLDER: &str = "uploads";

/// Per-file upload cap in MiB (overridable via `MAX_FILE_SIZE_MB`).
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 30;

/// Default TTL for signed access URLs, in seconds.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Maximum number of files accepted by a single multi-upload request.
pub const MAX_BATCH_FILES: usize = 10;

/// Extensions accepted by the validator. Lowercase, no leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "webp", "heic", "heif", "pdf", "doc", "docx",
];

/// MIME types browsers and OSes report for HEIC/HEIF payloads.
pub const HEIC_MIME_TYPES: &[&str] = &[
    "image/heic",
    "image/heif",
    "image/heic-sequence",
    "image/heif-sequence",
];

/// Generic MIME type some user agents attach to HEIC uploads.
pub const OCTET_STREAM: &str = "application/octet-stream";
