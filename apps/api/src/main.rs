mod advisor;
mod auth;
mod config;
mod errors;
mod export;
mod history;
mod matching;
mod profile;
mod routes;
mod state;
mod store;
mod tasks;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::advisor::GeminiAdvisor;
use crate::auth::registry::{SessionRegistry, SWEEP_INTERVAL};
use crate::config::Config;
use crate::export::PdfRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::RecordStore;

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

    info!("Starting CareerCrafter API v{}", env!("CARGO_PKG_VERSION"));

    // Record store over the JSON collections
    let store = Arc::new(RecordStore::new(&config.data_dir));
    info!("Record store at {}", store.dir().display());

    // Initialize advisor
    let mut advisor = GeminiAdvisor::new(config.gemini_api_key.clone())?;
    if let Some(base) = &config.gemini_api_base {
        advisor = advisor.with_base_url(base.as_str());
    }
    info!("Advisor initialized (model: {})", advisor::MODEL);

    // Sessions, with idle ones swept in the background
    let sessions = SessionRegistry::new();
    let _sweeper = sessions.spawn_sweeper(SWEEP_INTERVAL);

    let state = AppState {
        store,
        sessions,
        advisor: Arc::new(advisor),
        renderer: Arc::new(PdfRenderer),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
