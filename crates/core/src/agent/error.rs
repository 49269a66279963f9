use dbchat_model::{ErrorKind, ModelProviderError};
use thiserror::Error;

/// Why an agent invocation produced no answer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model request failed (network, credentials, throttling, a
    /// malformed stream, ...).
    #[error("{0}")]
    Model(Box<dyn ModelProviderError>),

    /// The model kept calling tools without settling on an answer.
    #[error("agent stopped after {0} iterations without a final answer")]
    IterationLimit(usize),
}

impl AgentError {
    /// Returns the provider error kind for model failures.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            AgentError::Model(err) => Some(err.kind()),
            AgentError::IterationLimit(_) => None,
        }
    }
}
