use crate::config::ServerConfig;
use crate::session::SessionStore;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub preview_rows: usize,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl()),
            preview_rows: config.preview_rows,
        }
    }
}
