use crate::config::Config;
use crate::interview::sessions::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live interviews. Each controller owns its own state; nothing global.
    pub sessions: SessionStore,
    pub config: Config,
}
