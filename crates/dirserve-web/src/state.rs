use std::sync::Arc;

use dirserve_core::Root;

use crate::config::ServerConfig;

/// Shared, read-only request context. The canonical root is the only
/// process-wide datum the handlers need.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub root: Root,
}

impl AppState {
    pub fn new(config: ServerConfig, root: Root) -> Self {
        Self {
            config: Arc::new(config),
            root,
        }
    }
}
