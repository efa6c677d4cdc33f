//! URL to key reverse mapping.
//!
//! Delete and sign operations accept either a raw key or a previously issued
//! URL, so each backend's distinct addressing scheme must round-trip back to
//! the canonical key. The parsing here is pure; backend adapters wire it into
//! `ObjectStorage::resolve_key` with their own configuration.

use url::Url;

/// Resolve a storage key from an S3-style URL.
///
/// Handles the three address shapes the S3 variants produce:
/// virtual-hosted (`https://{bucket}.{...}/{key}`), a configured public
/// domain (`https://cdn.example.com/{key}`), and path-style
/// (`https://{endpoint}/{bucket}/{key}`).
pub fn resolve_s3_key(url: &str, bucket: &str, public_url: Option<&str>) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    // Virtual-hosted style: hostname starts with the bucket name.
    if host.starts_with(bucket) {
        return non_empty(parsed.path().trim_start_matches('/'));
    }

    // Custom public domain configured for the bucket.
    if let Some(public) = public_url {
        if let Ok(public_parsed) = Url::parse(public) {
            if public_parsed.host_str() == Some(host) {
                return non_empty(parsed.path().trim_start_matches('/'));
            }
        }
    }

    // Path style: first segment is the bucket, the rest is the key.
    let mut segments = parsed.path_segments()?;
    if segments.next() == Some(bucket) {
        let rest: Vec<&str> = segments.collect();
        if !rest.is_empty() && !rest.iter().all(|s| s.is_empty()) {
            return Some(rest.join("/"));
        }
    }

    None
}

/// Resolve a Cloudinary-style public-ID from a delivery URL.
///
/// Takes every path segment after the `upload` marker, drops a leading
/// version marker (`v` followed by digits), joins the rest and strips the
/// trailing file extension. `None` when the marker segment is absent.
pub fn resolve_public_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.collect();

    let upload_idx = segments.iter().position(|s| *s == "upload")?;
    let mut rest = &segments[upload_idx + 1..];

    if rest.first().is_some_and(|s| is_version_marker(s)) {
        rest = &rest[1..];
    }
    if rest.is_empty() {
        return None;
    }

    let full_path = rest.join("/");
    non_empty(&strip_extension(&full_path))
}

/// `v` followed by one or more digits, e.g. `v1712345678`.
fn is_version_marker(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next() == Some('v') && segment.len() > 1 && chars.all(|c| c.is_ascii_digit())
}

/// Strip a trailing `.ext` from the last path segment, if present.
pub(crate) fn strip_extension(path: &str) -> String {
    let last_slash = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[last_slash..].rfind('.') {
        Some(dot) if last_slash + dot + 1 < path.len() => path[..last_slash + dot].to_string(),
        _ => path.to_string(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_hosted_url_resolves() {
        let key = resolve_s3_key(
            "https://my-bucket.nyc3.digitaloceanspaces.com/uploads/a.png",
            "my-bucket",
            None,
        );
        assert_eq!(key.as_deref(), Some("uploads/a.png"));
    }

    #[test]
    fn path_style_url_resolves() {
        let key = resolve_s3_key(
            "https://nyc3.digitaloceanspaces.com/my-bucket/uploads/a.png",
            "my-bucket",
            None,
        );
        assert_eq!(key.as_deref(), Some("uploads/a.png"));
    }

    #[test]
    fn public_domain_url_resolves() {
        let key = resolve_s3_key(
            "https://cdn.example.com/uploads/a.png",
            "my-bucket",
            Some("https://cdn.example.com"),
        );
        assert_eq!(key.as_deref(), Some("uploads/a.png"));
    }

    #[test]
    fn foreign_url_does_not_resolve() {
        assert_eq!(
            resolve_s3_key("https://elsewhere.example/uploads/a.png", "my-bucket", None),
            None
        );
    }

    #[test]
    fn bucket_only_url_does_not_resolve() {
        assert_eq!(
            resolve_s3_key("https://nyc3.digitaloceanspaces.com/my-bucket", "my-bucket", None),
            None
        );
        assert_eq!(
            resolve_s3_key("https://my-bucket.nyc3.digitaloceanspaces.com/", "my-bucket", None),
            None
        );
    }

    #[test]
    fn nested_key_keeps_all_segments() {
        let key = resolve_s3_key(
            "https://nyc3.digitaloceanspaces.com/my-bucket/uploads/2024/a.png",
            "my-bucket",
            None,
        );
        assert_eq!(key.as_deref(), Some("uploads/2024/a.png"));
    }

    #[test]
    fn cloudinary_url_with_version_marker() {
        let id = resolve_public_id(
            "https://res.cloudinary.com/demo/image/upload/v1712345678/uploads/abc.jpg",
        );
        assert_eq!(id.as_deref(), Some("uploads/abc"));
    }

    #[test]
    fn cloudinary_url_without_version_marker() {
        let id = resolve_public_id("https://res.cloudinary.com/demo/image/upload/uploads/abc.jpg");
        assert_eq!(id.as_deref(), Some("uploads/abc"));
    }

    #[test]
    fn cloudinary_version_marker_requires_digits() {
        // A folder that merely starts with 'v' is part of the public-ID.
        let id = resolve_public_id(
            "https://res.cloudinary.com/demo/image/upload/vault/abc.jpg",
        );
        assert_eq!(id.as_deref(), Some("vault/abc"));
    }

    #[test]
    fn cloudinary_url_without_upload_marker_does_not_resolve() {
        assert_eq!(
            resolve_public_id("https://res.cloudinary.com/demo/image/fetch/uploads/abc.jpg"),
            None
        );
    }

    #[test]
    fn strip_extension_only_touches_last_segment() {
        assert_eq!(strip_extension("uploads/a.b/photo.jpg"), "uploads/a.b/photo");
        assert_eq!(strip_extension("uploads/photo"), "uploads/photo");
        assert_eq!(strip_extension("uploads/photo."), "uploads/photo.");
    }
}
