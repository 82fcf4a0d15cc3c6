mod config;
mod error;
mod gemini;
mod mock;
mod models;
mod openai;
mod orchestrator;
mod prompt;
mod provider;
mod routes;
mod schema;
mod sqlite;
mod store;

use anyhow::Context;
use routes::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    config::AppConfig,
    gemini::GeminiProvider,
    openai::OpenAiProvider,
    orchestrator::Generator,
    provider::Provider,
    sqlite::SqliteStore,
    store::{GenerationStore, MemoryStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();

    // Fallback order: OpenAI, then Gemini, then the mock.
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();
    if let Some(settings) = config.openai.clone() {
        providers.push(Arc::new(OpenAiProvider::new(settings).context("building OpenAI client")?));
    }
    if let Some(settings) = config.gemini.clone() {
        providers.push(Arc::new(GeminiProvider::new(settings).context("building Gemini client")?));
    }

    let store: Arc<dyn GenerationStore> = match &config.database_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using SQLite generation store");
            Arc::new(SqliteStore::open(path).with_context(|| format!("opening database at {}", path.display()))?)
        }
        None => {
            tracing::warn!("DATABASE_PATH not set; generations are kept in memory only");
            Arc::new(MemoryStore::default())
        }
    };

    let generator = Generator::new(providers, store);
    let names = generator.provider_names();
    if names.is_empty() {
        tracing::warn!("No provider credentials configured; every request will use the mock blueprint");
    } else {
        tracing::info!(providers = ?names, "Provider fallback chain");
    }

    let app = router(AppState { generator: Arc::new(generator) });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
