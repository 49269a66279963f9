//! Provider-neutral protocol between the SQL agent and a chat model.
//!
//! The agent never talks to an HTTP API directly. It builds a
//! [`ModelRequest`], hands it to some [`ModelProvider`], and drains the
//! streamed [`ModelResponse`] event by event. Swapping Groq for another
//! OpenAI-compatible endpoint (or for a scripted fake in tests) is then a
//! matter of picking a different provider value.
//!
//! Nothing in this crate performs I/O.

#![deny(missing_docs)]

mod error;
mod provider;
mod provider_message;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use provider_message::*;
pub use request::*;
pub use response::*;
