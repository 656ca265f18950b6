use crate::config::ServerConfig;
use std::sync::Arc;

/// Shared server state. Workbooks are never cached here: every operation
/// opens, mutates, saves, and discards its own file (the save is the one
/// commit point), so the only cross-call state is configuration.
pub struct AppState {
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }
}
