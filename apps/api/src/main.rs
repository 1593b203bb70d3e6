mod admin;
mod auth;
mod chat;
mod config;
mod errors;
mod knowledge;
mod llm_client;
mod marketing;
mod models;
mod persistence;
mod profile;
mod prompting;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::llm_client::LlmClient;
use crate::persistence::file::FileGateway;
use crate::persistence::postgres::PgGateway;
use crate::persistence::PersistenceGateway;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Advisor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize persistence
    let gateway: Arc<dyn PersistenceGateway> = match &config.storage {
        StorageBackend::Postgres { database_url } => {
            Arc::new(PgGateway::connect(database_url).await?)
        }
        StorageBackend::File { data_dir } => {
            tokio::fs::create_dir_all(data_dir).await?;
            info!("Using flat-file storage at {}", data_dir.display());
            Arc::new(FileGateway::new(data_dir.clone()))
        }
    };

    // Initialize LLM client
    let llm = LlmClient::from_config(&config)?;
    info!("LLM client initialized (endpoint: {})", llm.endpoint());

    let state = AppState::new(config.clone(), gateway, Arc::new(llm));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the UI origin once it is configurable

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
