//! Shared key derivation for storage backends.
//!
//! Key format: `{folder}/{filename}.{extension}`, folder defaulting to
//! `uploads`. The extension reflects the transcoder's output, not the
//! original upload's extension.

use filedock_core::constants::DEFAULT_FOLDER;
use filedock_core::models::UploadOptions;
use uuid::Uuid;

/// Derive the storage key for an upload.
///
/// A caller-supplied filename is used verbatim with the final extension
/// appended — there is no collision check, so reuse means last-write-wins at
/// the backend. Without one, a uuid-v4 name makes collisions practically
/// impossible.
pub fn derive_key(final_extension: &str, options: &UploadOptions) -> String {
    let folder = options.folder.as_deref().unwrap_or(DEFAULT_FOLDER);
    match options.filename.as_deref() {
        Some(filename) => format!("{}/{}.{}", folder, filename, final_extension),
        None => format!("{}/{}.{}", folder, Uuid::new_v4(), final_extension),
    }
}
