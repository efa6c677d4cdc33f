//! Configuration module
//!
//! Environment-sourced configuration for the gateway. One credential set per
//! backend variant; only the variant selected by `STORAGE_BACKEND` has to be
//! configured, which `Config::validate_for_backend` enforces at startup.

use std::env;

use crate::constants::DEFAULT_MAX_FILE_SIZE_MB;
use crate::models::StorageBackendKind;

const DEFAULT_SERVER_PORT: u16 = 3000;

/// DigitalOcean-Spaces-style S3 settings (variant A).
#[derive(Clone, Debug)]
pub struct SpacesConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Cloudflare-R2-style S3 settings (variant B).
#[derive(Clone, Debug)]
pub struct R2Config {
    pub account_id: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom public domain serving the bucket, e.g. `https://cdn.example.com`.
    /// Without it, objects are private and signed URLs are the only read path.
    pub public_url: Option<String>,
}

impl R2Config {
    /// S3 API endpoint for the account.
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

/// Cloudinary-style media CDN settings (variant C).
#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub max_file_size_bytes: usize,
    pub storage_backend: StorageBackendKind,
    pub spaces: Option<SpacesConfig>,
    pub r2: Option<R2Config>,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let server_port = env_parse("SERVER_PORT", DEFAULT_SERVER_PORT)?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let max_file_size_mb: usize = env_parse("MAX_FILE_SIZE_MB", DEFAULT_MAX_FILE_SIZE_MB)?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "r2".to_string())
            .parse::<StorageBackendKind>()
            .map_err(|e| anyhow::anyhow!(e))?;

        Ok(Config {
            server_port,
            environment,
            cors_origins,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            storage_backend,
            spaces: spaces_from_env(),
            r2: r2_from_env(),
            cloudinary: cloudinary_from_env(),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Fail fast when the selected backend's credentials are missing.
    pub fn validate_for_backend(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackendKind::Spaces if self.spaces.is_none() => Err(anyhow::anyhow!(
                "STORAGE_BACKEND=spaces requires SPACES_ENDPOINT, SPACES_REGION, SPACES_BUCKET, \
                 SPACES_ACCESS_KEY_ID and SPACES_SECRET_ACCESS_KEY"
            )),
            StorageBackendKind::R2 if self.r2.is_none() => Err(anyhow::anyhow!(
                "STORAGE_BACKEND=r2 requires R2_ACCOUNT_ID, R2_BUCKET, R2_ACCESS_KEY_ID \
                 and R2_SECRET_ACCESS_KEY"
            )),
            StorageBackendKind::Cloudinary if self.cloudinary.is_none() => Err(anyhow::anyhow!(
                "STORAGE_BACKEND=cloudinary requires CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY \
                 and CLOUDINARY_API_SECRET"
            )),
            _ => Ok(()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn spaces_from_env() -> Option<SpacesConfig> {
    Some(SpacesConfig {
        endpoint: env::var("SPACES_ENDPOINT").ok()?,
        region: env::var("SPACES_REGION").ok()?,
        bucket: env::var("SPACES_BUCKET").ok()?,
        access_key_id: env::var("SPACES_ACCESS_KEY_ID").ok()?,
        secret_access_key: env::var("SPACES_SECRET_ACCESS_KEY").ok()?,
    })
}

fn r2_from_env() -> Option<R2Config> {
    Some(R2Config {
        account_id: env::var("R2_ACCOUNT_ID").ok()?,
        bucket: env::var("R2_BUCKET").ok()?,
        access_key_id: env::var("R2_ACCESS_KEY_ID").ok()?,
        secret_access_key: env::var("R2_SECRET_ACCESS_KEY").ok()?,
        public_url: env::var("R2_PUBLIC_URL").ok(),
    })
}

fn cloudinary_from_env() -> Option<CloudinaryConfig> {
    Some(CloudinaryConfig {
        cloud_name: env::var("CLOUDINARY_CLOUD_NAME").ok()?,
        api_key: env::var("CLOUDINARY_API_KEY").ok()?,
        api_secret: env::var("CLOUDINARY_API_SECRET").ok()?,
    })
}
