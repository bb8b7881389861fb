mod config;
mod docx;
mod errors;
mod generation;
mod ingest;
mod layout;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::docx::Template;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Stickers API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Sheet capacity: {} slots, max {} pages per run",
        config.slot_capacity, config.max_pages
    );

    let state = AppState::new(config.clone());

    // Template is read in the background; generation answers 503 until it is in place.
    tokio::spawn(load_template(state.clone()));

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

/// Reads and indexes the template archive, then makes it available to handlers.
async fn load_template(state: AppState) {
    let config = &state.config;
    let template = match Template::load(
        &config.template_path,
        config.slot_capacity,
        config.run_formatting(),
    )
    .await
    {
        Ok(template) => template,
        Err(e) => {
            error!("Failed to load template '{}': {e}", config.template_path);
            return;
        }
    };

    let summary = template.summary();
    info!(
        "Template loaded from '{}': {} slot regions, {} identifiers",
        config.template_path, summary.slot_regions, summary.identifier_count
    );
    if !summary.missing_slots.is_empty() {
        warn!(
            "Template has no placeholder for {} slots: {:?}",
            summary.missing_slots.len(),
            summary.missing_slots
        );
    }

    if !state.install_template(template) {
        warn!("Template was already installed; keeping the first one");
    }
}
