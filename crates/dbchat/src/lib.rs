//! A web chat over a SQL database: every question is answered by a
//! tool-using model agent that can list tables, inspect schemas and run
//! queries.
//!
//! The crate is also the `dbchat` binary; as a library it exposes the
//! pieces the binary wires together so they can be embedded or tested.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
mod factory;
mod session;
mod sessions;
mod state;
#[cfg(test)]
mod test_support;
pub mod web;

pub use config::{Args, Config, ConfigurationError};
pub use factory::{
    AgentFactory, AgentSettings, DEFAULT_SYSTEM_PROMPT, DEFAULT_TOP_K,
};
pub use session::{
    DEFAULT_MAX_OUTPUT_CHARS, ERROR_PREFIX, LARGE_RESULT_ADVISORY, Session,
    TurnOutcome,
};
pub use sessions::{
    DEFAULT_SESSION_IDLE_TIMEOUT, SessionRegistry, SharedSession,
};
pub use state::AppState;

/// Re-exports of [`dbchat_core`] crate.
pub mod core {
    pub use dbchat_core::*;
}
