mod config;
mod errors;
mod layout;
mod routes;
mod standards;
mod state;
mod worksheet;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::default_page_config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparsable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting worksheets v{}", env!("CARGO_PKG_VERSION"));

    // US letter, 0.75" margins
    let page_config = default_page_config();
    info!(
        "Layout page config: {}x{}pt, margin {}pt",
        page_config.page_width_pt, page_config.page_height_pt, page_config.margin_pt
    );
    info!(packs_dir = %config.packs_dir.display(), "Sample packs directory");

    let state = AppState::new(config.clone(), page_config);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
