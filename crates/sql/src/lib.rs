//! Database access for the SQL chat agent: a TTL-cached connection
//! provider, a dialect-aware `Database` handle and the tools the agent
//! uses to explore and query it.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod connection;
mod database;
mod dialect;
mod error;
#[cfg(test)]
mod fixtures;
mod provider;
pub mod tools;

pub use connection::{Connector, SqlConnector};
pub use database::{Database, MAX_CELL_CHARS, SAMPLE_ROWS};
pub use dialect::Dialect;
pub use error::{ConnectionError, QueryError};
pub use provider::{ConnectionProvider, DEFAULT_CONNECTION_TTL};
pub use tools::SqlToolkit;
