//! Cloudinary-style media CDN backend (variant C).
//!
//! Addressing is by provider-assigned public-ID (the storage key with its
//! extension stripped), not by path-derived key. The delivery URL is
//! returned by the provider on upload and stored verbatim; it cannot be
//! reconstructed from the public-ID alone.
//!
//! Upload and destroy requests carry a SHA-256 parameter signature; batch
//! deletion goes through the Admin API with basic auth; signed access uses
//! an authenticated delivery URL with an expiring `__cld_token__`
//! (HMAC-SHA-256).

use crate::resolve::{resolve_public_id, strip_extension};
use crate::traits::{ObjectStorage, StorageError, StorageResult};
use async_trait::async_trait;
use filedock_core::config::CloudinaryConfig;
use filedock_core::models::{StorageBackendKind, StorageObjectRef};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Cloudinary storage adapter
#[derive(Clone)]
pub struct CloudinaryStorage {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryStorage {
    pub fn new(config: &CloudinaryConfig) -> Self {
        CloudinaryStorage {
            http: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn api_url(&self, op: &str) -> String {
        format!("{}/{}/{}", API_BASE, self.cloud_name, op)
    }

    /// SHA-256 parameter signature: `k=v` pairs sorted by name, joined with
    /// `&`, with the API secret appended. The provider distinguishes SHA-1
    /// and SHA-256 signatures by hex length.
    fn sign_params(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);

        let to_sign = sorted
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Keys carry an extension, public-IDs do not; accept either form.
    fn public_id_for(key: &str) -> String {
        strip_extension(key)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Expiring access token for an authenticated delivery path.
///
/// `path` is the URL path being authorized (everything after the domain).
/// Pure so the TTL arithmetic and digest stay unit-testable.
fn delivery_token(api_secret: &str, path: &str, expires_at: u64) -> String {
    let message = format!("exp={}~url={}", expires_at, path);
    let mut mac =
        HmacSha256::new_from_slice(api_secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("exp={}~hmac={}", expires_at, digest)
}

#[async_trait]
impl ObjectStorage for CloudinaryStorage {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StorageObjectRef> {
        let public_id = Self::public_id_for(key);
        let timestamp = unix_now().to_string();
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let signature = self.sign_params(&[
            ("invalidate", "true"),
            ("overwrite", "true"),
            ("public_id", &public_id),
            ("timestamp", &timestamp),
        ]);

        let file_part = reqwest::multipart::Part::bytes(data)
            .file_name(key.to_string())
            .mime_str(content_type)
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("public_id", public_id.clone())
            .text("timestamp", timestamp)
            .text("overwrite", "true")
            .text("invalidate", "true")
            .text("api_key", self.api_key.clone())
            .text("signature", signature);

        let response = self
            .http
            .post(self.api_url("image/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                public_id = %public_id,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Cloudinary upload failed"
            );
            return Err(StorageError::UploadFailed(format!(
                "upload returned {}: {}",
                status, body
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::info!(
            public_id = %parsed.public_id,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload successful"
        );

        // The provider URL must be stored verbatim; it embeds a version
        // marker that cannot be rebuilt from the public-ID.
        Ok(StorageObjectRef {
            url: parsed.secure_url,
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let public_id = Self::public_id_for(key);
        let timestamp = unix_now().to_string();
        let signature =
            self.sign_params(&[("public_id", &public_id), ("timestamp", &timestamp)]);

        let response = self
            .http
            .post(self.api_url("image/destroy"))
            .form(&[
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(StorageError::DeleteFailed(format!(
                "destroy returned {}",
                status
            )));
        }

        let parsed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        // "not found" keeps the ensure-absent contract: deleting a missing
        // public-ID is a success, not an error.
        match parsed.result.as_str() {
            "ok" | "not found" => {
                tracing::info!(public_id = %public_id, result = %parsed.result, "Cloudinary delete");
                Ok(())
            }
            other => Err(StorageError::DeleteFailed(format!(
                "destroy returned result '{}'",
                other
            ))),
        }
    }

    async fn delete_batch(&self, keys: &[String]) -> StorageResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let public_ids: Vec<String> = keys.iter().map(|k| Self::public_id_for(k)).collect();
        let query: Vec<(&str, &str)> = public_ids
            .iter()
            .map(|id| ("public_ids[]", id.as_str()))
            .collect();

        let response = self
            .http
            .delete(self.api_url("resources/image/upload"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .query(&query)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                key_count = keys.len(),
                "Cloudinary batch delete failed"
            );
            return Err(StorageError::DeleteFailed(format!(
                "batch delete returned {}: {}",
                status, body
            )));
        }

        tracing::info!(key_count = keys.len(), "Cloudinary batch delete successful");
        Ok(())
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let expires_at = unix_now() + expires_in.as_secs();
        let path = format!("/{}/image/authenticated/{}", self.cloud_name, key);
        let token = delivery_token(&self.api_secret, &path, expires_at);

        Ok(format!(
            "{}{}?__cld_token__={}",
            DELIVERY_BASE, path, token
        ))
    }

    fn resolve_key(&self, url: &str) -> Option<String> {
        resolve_public_id(url)
    }

    fn backend_kind(&self) -> StorageBackendKind {
        StorageBackendKind::Cloudinary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> CloudinaryStorage {
        CloudinaryStorage::new(&CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key123".into(),
            api_secret: "shhh".into(),
        })
    }

    #[test]
    fn signature_sorts_params_by_name() {
        let storage = storage();
        let forwards = storage.sign_params(&[("a", "1"), ("b", "2")]);
        let backwards = storage.sign_params(&[("b", "2"), ("a", "1")]);
        assert_eq!(forwards, backwards);
        assert_eq!(forwards.len(), 64); // sha256 hex
    }

    #[test]
    fn signature_depends_on_secret() {
        let a = storage();
        let b = CloudinaryStorage::new(&CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key123".into(),
            api_secret: "other".into(),
        });
        assert_ne!(
            a.sign_params(&[("public_id", "x")]),
            b.sign_params(&[("public_id", "x")])
        );
    }

    #[test]
    fn public_id_strips_key_extension() {
        assert_eq!(CloudinaryStorage::public_id_for("uploads/a.jpg"), "uploads/a");
        // Resolved public-IDs come back without an extension; idempotent.
        assert_eq!(CloudinaryStorage::public_id_for("uploads/a"), "uploads/a");
    }

    #[test]
    fn delivery_token_embeds_expiry() {
        let token = delivery_token("shhh", "/demo/image/authenticated/uploads/a.jpg", 1700000060);
        assert!(token.starts_with("exp=1700000060~hmac="));
        let digest = token.split("~hmac=").nth(1).unwrap();
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn delivery_token_varies_with_path_and_expiry() {
        let a = delivery_token("shhh", "/demo/image/authenticated/a.jpg", 100);
        let b = delivery_token("shhh", "/demo/image/authenticated/b.jpg", 100);
        let c = delivery_token("shhh", "/demo/image/authenticated/a.jpg", 200);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn signed_url_carries_requested_ttl() {
        let url = storage()
            .signed_url("uploads/a.jpg", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("https://res.cloudinary.com/demo/image/authenticated/uploads/a.jpg?__cld_token__=exp="));

        let exp: u64 = url
            .split("exp=")
            .nth(1)
            .unwrap()
            .split('~')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        let now = unix_now();
        assert!(exp >= now + 58 && exp <= now + 62, "exp {} vs now {}", exp, now);
    }

    #[test]
    fn provider_url_resolves_to_public_id() {
        let storage = storage();
        let id = storage
            .resolve_key("https://res.cloudinary.com/demo/image/upload/v1712345678/uploads/a.jpg");
        assert_eq!(id.as_deref(), Some("uploads/a"));
    }
}
