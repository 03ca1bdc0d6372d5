//! Scorecard API
//!
//! REST API and CLI for scraping golf course scorecards.

use axum::{routing::get, routing::post, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scorecard_api::cli::{self, Cli, Commands};
use scorecard_api::config::AppConfig;
use scorecard_api::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorecard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Serve { host, port } => run_server(host, port).await,
        Commands::Scrape {
            url,
            format,
            browser,
            timeout,
        } => cli::run_scrape(url, format, browser, timeout).await,
        Commands::Parse {
            input,
            url,
            provider,
            format,
        } => cli::run_parse(input, url, provider, format),
    }
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!(
        "Browser: {}, navigation timeout {}s",
        config.browser.executable.as_deref().unwrap_or("auto-detect"),
        config.browser.navigation_timeout_secs
    );

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    // Create application state
    let state = Arc::new(AppState { config });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/api/golf/scrape-url", post(routes::scrape_url))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
