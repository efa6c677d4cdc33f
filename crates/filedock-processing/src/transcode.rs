//! HEIC/HEIF to JPEG transcoding
//!
//! HEIC/HEIF payloads are converted to JPEG in memory before storage; every
//! other format passes through untouched. A decode or encode failure is fatal
//! to the upload — un-decodable HEIC bytes must never be stored under a
//! `.jpg` name where they would corrupt downstream consumers.
//!
//! Decoding requires the system libheif library and is gated behind the
//! `heic` cargo feature. Without it, HEIC inputs fail with
//! [`TranscodeError::SupportDisabled`] rather than falling back to storing
//! the original bytes.

/// Transcoding errors
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("HEIC decode failed: {0}")]
    Decode(String),

    #[error("JPEG encode failed: {0}")]
    Encode(String),

    #[error("HEIC support is not enabled in this build (heic feature)")]
    SupportDisabled,
}

impl From<TranscodeError> for filedock_core::AppError {
    fn from(err: TranscodeError) -> Self {
        filedock_core::AppError::Transcode(err.to_string())
    }
}

/// Result of the conditional transcoding step. Extension and content type
/// always agree with the bytes in `data`.
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    pub data: Vec<u8>,
    pub content_type: String,
    pub extension: String,
}

/// Whether the transcoder triggers for this extension.
///
/// The trigger is extension-driven: `heic`/`heif` in any case. Uploads
/// mislabeled as `application/octet-stream` are covered because their
/// extension still names the container format.
pub fn needs_transcode(extension: &str) -> bool {
    matches!(
        extension.to_ascii_lowercase().as_str(),
        "heic" | "heif"
    )
}

/// Convert HEIC/HEIF input to JPEG; identity for everything else.
///
/// `extension` is the validated, lowercased extension of the original
/// filename (no dot). On trigger the output carries `jpg`/`image/jpeg`.
pub fn maybe_transcode(
    data: Vec<u8>,
    extension: &str,
    content_type: &str,
) -> Result<TranscodeOutput, TranscodeError> {
    if !needs_transcode(extension) {
        return Ok(TranscodeOutput {
            data,
            content_type: content_type.to_string(),
            extension: extension.to_string(),
        });
    }

    let size_in = data.len();
    let jpeg = heic_to_jpeg(&data)?;
    tracing::debug!(
        size_in,
        size_out = jpeg.len(),
        "Converted HEIC upload to JPEG"
    );

    Ok(TranscodeOutput {
        data: jpeg,
        content_type: "image/jpeg".to_string(),
        extension: "jpg".to_string(),
    })
}

/// Decode a HEIC/HEIF container and re-encode as JPEG at maximum quality.
#[cfg(feature = "heic")]
pub fn heic_to_jpeg(data: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data).map_err(|e| TranscodeError::Decode(e.to_string()))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| TranscodeError::Decode("missing interleaved RGB plane".to_string()))?;

    let width = plane.width as usize;
    let height = plane.height as usize;
    let stride = plane.stride;

    // The decoder may pad rows; copy row by row into a tightly packed buffer.
    let mut rgb = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        let start = row * stride;
        rgb.extend_from_slice(&plane.data[start..start + width * 3]);
    }

    let mut out = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(std::io::Cursor::new(&mut out), 100);
    image::ImageEncoder::write_image(
        encoder,
        &rgb,
        width as u32,
        height as u32,
        image::ExtendedColorType::Rgb8,
    )
    .map_err(|e| TranscodeError::Encode(e.to_string()))?;

    Ok(out)
}

#[cfg(not(feature = "heic"))]
pub fn heic_to_jpeg(_data: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    Err(TranscodeError::SupportDisabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_matrix() {
        assert!(needs_transcode("heic"));
        assert!(needs_transcode("heif"));
        assert!(needs_transcode("HEIC"));
        assert!(!needs_transcode("jpg"));
        assert!(!needs_transcode("png"));
        assert!(!needs_transcode("pdf"));
    }

    #[test]
    fn pass_through_is_identity() {
        let data = vec![1u8, 2, 3, 4];
        let out = maybe_transcode(data.clone(), "png", "image/png").unwrap();
        assert_eq!(out.data, data);
        assert_eq!(out.content_type, "image/png");
        assert_eq!(out.extension, "png");
    }

    #[test]
    fn heic_garbage_is_fatal() {
        // Regardless of the heic feature, garbage HEIC bytes must error out,
        // never pass through as a "jpg".
        let result = maybe_transcode(vec![0u8; 32], "heic", "image/heic");
        assert!(result.is_err());
    }

    #[cfg(feature = "heic")]
    #[test]
    fn transcoded_output_agrees_with_jpeg() {
        // Only exercised when a real HEIF fixture decodes; garbage input is
        // covered above. The invariant under test: extension and content
        // type always agree on trigger.
        if let Ok(out) = maybe_transcode(vec![0u8; 32], "heic", "application/octet-stream") {
            assert_eq!(out.extension, "jpg");
            assert_eq!(out.content_type, "image/jpeg");
        }
    }
}
