//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::domain::PollSessions;
use crate::service::Relay;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The relay instance every transport talks to.
    pub relay: Arc<Relay>,
    /// Open long-polling sessions.
    pub poll_sessions: Arc<PollSessions>,
    /// Loaded configuration.
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Builds a fresh relay and an empty session table from `config`.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            relay: Arc::new(Relay::from_config(&config)),
            poll_sessions: Arc::new(PollSessions::new()),
            config: Arc::new(config),
        }
    }
}
