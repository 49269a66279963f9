//! The SQL chat agent: tool plumbing, the tool-using agent loop and the
//! conversation transcript it feeds.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, AgentError, AgentResponse, AgentStep,
    DEFAULT_MAX_ITERATIONS, ProgressEvent, ProgressSink, QueryAgent,
};
pub use model_client::{ModelClient, ModelClientResponse};
