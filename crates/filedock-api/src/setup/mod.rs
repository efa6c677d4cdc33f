//! Application setup and initialization
//!
//! All initialization logic lives here instead of main.rs so the pieces can
//! be exercised independently.

pub mod routes;
pub mod server;
pub mod telemetry;

use crate::state::AppState;
use anyhow::{Context, Result};
use filedock_core::Config;
use filedock_storage::create_storage;
use std::sync::Arc;

/// Initialize the entire application
pub fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate_for_backend()
        .context("Configuration validation failed")?;

    telemetry::init_telemetry(&config);

    tracing::info!(
        backend = %config.storage_backend,
        "Configuration loaded and validated successfully"
    );

    let storage = create_storage(&config).context("Failed to initialize storage backend")?;

    let state = Arc::new(AppState::new(config, storage));

    let router = routes::setup_routes(&state)?;

    Ok((state, router))
}
