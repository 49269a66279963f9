use std::sync::Arc;

use dbchat_sql::{ConnectionProvider, SqlConnector};

use crate::factory::AgentFactory;
use crate::session::DEFAULT_MAX_OUTPUT_CHARS;
use crate::sessions::SessionRegistry;

/// Everything the HTTP handlers share.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide database connection.
    pub connections: Arc<ConnectionProvider<SqlConnector>>,
    /// Builds the agent of each new session.
    pub factory: AgentFactory,
    /// Live sessions.
    pub sessions: SessionRegistry,
    /// Answer size threshold applied to new sessions.
    pub max_output_chars: usize,
}

impl AppState {
    /// Wires the shared services together.
    pub fn new(
        connections: ConnectionProvider<SqlConnector>,
        factory: AgentFactory,
    ) -> Self {
        Self {
            connections: Arc::new(connections),
            factory,
            sessions: SessionRegistry::new(),
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
        }
    }

    /// Sets the answer size threshold.
    #[inline]
    pub fn with_max_output_chars(mut self, max_output_chars: usize) -> Self {
        self.max_output_chars = max_output_chars;
        self
    }
}
