// Main entry point for the market analysis server

use std::sync::Arc;

use anyhow::{Context, Result};
use market::{ImageCache, ListingExtractor, MarketPipeline, RetryPolicy, RetryingFetcher};
use server_core::{build_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,market=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting card market analysis server");

    let mut pipeline = MarketPipeline::new(
        RetryingFetcher::over_http(RetryPolicy::default()),
        ListingExtractor::default(),
    );

    if let Ok(cache_dir) = std::env::var("IMAGE_CACHE_DIR") {
        tracing::info!(dir = %cache_dir, "Image cache enabled");
        pipeline = pipeline.with_cache(Arc::new(ImageCache::new(cache_dir)));
    }

    let app = build_app(AppState::new(pipeline));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    tracing::info!("Listening on {addr}");
    tracing::info!("Analyze endpoint: http://localhost:{port}/api/analyze?query=...");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
