//! Command line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use dbchat_core::DEFAULT_MAX_ITERATIONS;
use dbchat_openai_model::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use secrecy::SecretString;
use thiserror::Error;

use crate::factory::{AgentSettings, DEFAULT_SYSTEM_PROMPT, DEFAULT_TOP_K};
use crate::session::DEFAULT_MAX_OUTPUT_CHARS;
use crate::sessions::DEFAULT_SESSION_IDLE_TIMEOUT;

/// Raw command line arguments, each with an environment fallback.
#[derive(Parser)]
#[command(
    name = "dbchat",
    version,
    about = "Chat with a SQL database from the browser"
)]
pub struct Args {
    /// Connection URI of the database to chat with.
    #[arg(long, env = "DATABASE_URI", hide_env_values = true)]
    pub database_uri: Option<String>,

    /// API key of the model provider.
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "LLM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model name.
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Address the web UI listens on.
    #[arg(long, env = "DBCHAT_BIND", default_value = "127.0.0.1:8501")]
    pub bind: SocketAddr,

    /// Seconds a database connection is reused before reconnecting.
    #[arg(long, env = "DBCHAT_CONNECTION_TTL_SECS", default_value_t = 3600)]
    pub connection_ttl_secs: u64,

    /// Seconds a session may sit unused before it is dropped.
    #[arg(
        long,
        env = "DBCHAT_SESSION_IDLE_SECS",
        default_value_t = DEFAULT_SESSION_IDLE_TIMEOUT.as_secs()
    )]
    pub session_idle_secs: u64,

    /// Answers longer than this many characters are replaced by an advisory.
    #[arg(
        long,
        env = "DBCHAT_MAX_OUTPUT_CHARS",
        default_value_t = DEFAULT_MAX_OUTPUT_CHARS
    )]
    pub max_output_chars: usize,

    /// Model requests allowed per query.
    #[arg(
        long,
        env = "DBCHAT_MAX_ITERATIONS",
        default_value_t = DEFAULT_MAX_ITERATIONS
    )]
    pub max_iterations: usize,

    /// Row limit the agent is told to apply to its queries.
    #[arg(long, env = "DBCHAT_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// File with a custom system prompt; `{dialect}` and `{top_k}` are
    /// substituted.
    #[arg(long, env = "DBCHAT_SYSTEM_PROMPT_FILE")]
    pub system_prompt_file: Option<PathBuf>,
}

/// Invalid or incomplete configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required secret is absent or blank.
    #[error("{0} is not set")]
    MissingSecret(&'static str),

    /// The custom system prompt could not be read.
    #[error("failed to read system prompt from {}: {source}", path.display())]
    SystemPrompt {
        /// The configured file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A numeric setting is out of range.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validated configuration.
#[derive(Debug)]
pub struct Config {
    /// Database connection URI.
    pub database_uri: SecretString,
    /// Model provider API key.
    pub api_key: SecretString,
    /// Model provider base URL.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Listen address.
    pub bind: SocketAddr,
    /// Connection reuse window.
    pub connection_ttl: Duration,
    /// How long an unused session is kept.
    pub session_idle_timeout: Duration,
    /// Answer size threshold in characters.
    pub max_output_chars: usize,
    /// How agents are built.
    pub agent: AgentSettings,
}

impl Config {
    /// Validates `args`.
    pub fn from_args(args: Args) -> Result<Self, ConfigurationError> {
        let database_uri = required_secret(args.database_uri, "DATABASE_URI")?;
        let api_key = required_secret(args.api_key, "LLM_API_KEY")?;

        if args.connection_ttl_secs == 0 {
            return Err(ConfigurationError::Zero("DBCHAT_CONNECTION_TTL_SECS"));
        }
        if args.session_idle_secs == 0 {
            return Err(ConfigurationError::Zero("DBCHAT_SESSION_IDLE_SECS"));
        }
        if args.max_output_chars == 0 {
            return Err(ConfigurationError::Zero("DBCHAT_MAX_OUTPUT_CHARS"));
        }
        if args.top_k == 0 {
            return Err(ConfigurationError::Zero("DBCHAT_TOP_K"));
        }

        let system_prompt = match args.system_prompt_file {
            Some(path) => std::fs::read_to_string(&path).map_err(|source| {
                ConfigurationError::SystemPrompt { path, source }
            })?,
            None => DEFAULT_SYSTEM_PROMPT.to_owned(),
        };

        Ok(Self {
            database_uri,
            api_key,
            base_url: args.base_url,
            model: args.model,
            bind: args.bind,
            connection_ttl: Duration::from_secs(args.connection_ttl_secs),
            session_idle_timeout: Duration::from_secs(args.session_idle_secs),
            max_output_chars: args.max_output_chars,
            agent: AgentSettings {
                system_prompt,
                max_iterations: args.max_iterations,
                top_k: args.top_k,
            },
        })
    }
}

fn required_secret(
    value: Option<String>,
    name: &'static str,
) -> Result<SecretString, ConfigurationError> {
    match value {
        Some(value) if !value.trim().is_empty() => {
            Ok(SecretString::from(value))
        }
        _ => Err(ConfigurationError::MissingSecret(name)),
    }
}
