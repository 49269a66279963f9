//! Serves the database chat UI.

#[macro_use]
extern crate tracing;

use anyhow::Context;
use clap::Parser;
use dbchat::{AgentFactory, AppState, Args, Config};
use dbchat_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use dbchat_sql::{ConnectionProvider, SqlConnector};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_args(Args::parse())?;

    let model_config =
        OpenAIConfigBuilder::with_api_key(config.api_key.expose_secret())
            .with_base_url(config.base_url)
            .with_model(config.model)
            .build();
    info!(
        "using model {} at {}",
        model_config.model(),
        model_config.base_url()
    );
    let provider = OpenAIProvider::new(model_config)?;
    let factory = AgentFactory::new(provider, config.agent);

    let connections = ConnectionProvider::new(
        SqlConnector::new(),
        config.database_uri,
        config.connection_ttl,
    );
    // Refuse to serve a chat that could never answer.
    let database = connections
        .get_connection()
        .await
        .context("cannot reach the database")?;
    info!(
        "connected to {} database with tables: {}",
        database.dialect(),
        database.usable_table_names().await?.join(", ")
    );

    let state = AppState::new(connections, factory)
        .with_max_output_chars(config.max_output_chars);
    let sweeper = state.sessions.spawn_sweeper(config.session_idle_timeout);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, dbchat::web::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    sweeper.abort();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
