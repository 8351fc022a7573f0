//! booknaru service binary.
//!
//! AI-assisted book discovery over the public library catalog.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use booknaru_api::config::Config;
use booknaru_api::server::{build_router, AppState};
use booknaru_catalog::LibraryClient;
use booknaru_discovery::{AiProvider, OpenAiProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("booknaru=info".parse()?)
                .add_directive("booknaru_api=info".parse()?)
                .add_directive("booknaru_catalog=info".parse()?)
                .add_directive("booknaru_discovery=info".parse()?),
        )
        .init();

    info!("Starting booknaru service...");

    // Load configuration
    let config = Config::default();

    let library_auth_key = config
        .library_auth_key
        .clone()
        .context("LIBRARY_AUTH_KEY is required")?;
    let openai_api_key = config
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY is required")?;

    // Initialize upstream clients
    let catalog = LibraryClient::with_timeout(
        config.library_api_url.as_str(),
        library_auth_key,
        config.catalog_timeout,
    )
    .context("Failed to create library API client")?;

    let ai: Arc<dyn AiProvider> = Arc::new(
        OpenAiProvider::new(openai_api_key)
            .context("Failed to create AI provider")?
            .with_base_url(config.openai_api_url.as_str()),
    );

    info!(
        library_api = %config.library_api_url,
        model = %config.openai_model,
        "Upstream clients configured"
    );

    // Build application state and router
    let port = config.port;
    let state = AppState::new(config, catalog, ai);
    let app = build_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port, "booknaru service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
