//! Application state.
//!
//! One explicitly constructed storage adapter, injected at startup and shared
//! read-only across requests.

use filedock_core::Config;
use filedock_storage::ObjectStorage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn ObjectStorage>,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { config, storage }
    }
}
