//! Route configuration and setup.

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use filedock_core::constants::MAX_BATCH_FILES;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: &Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(&state.config.cors_origins);

    // Batch uploads carry up to MAX_BATCH_FILES files per request, plus
    // multipart framing overhead.
    let body_limit = state.config.max_file_size_bytes * MAX_BATCH_FILES + 1024 * 1024;

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/upload/single", post(handlers::upload::upload_single))
        .route("/upload/multiple", post(handlers::upload::upload_multiple))
        .route("/upload/delete", delete(handlers::upload::delete_file))
        .route(
            "/upload/delete-multiple",
            delete(handlers::upload::delete_multiple),
        )
        .route("/upload/signed-url", post(handlers::upload::signed_url))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    Ok(app)
}

fn setup_cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    }
}
