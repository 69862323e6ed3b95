//! Application state and router assembly.

use std::sync::Arc;

use axum::{routing::get, Router};
use market::fetch::{FetchTransport, Sleeper};
use market::MarketPipeline;
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared per-process state. The pipeline itself is stateless across
/// requests; sharing it only reuses clients and configuration.
pub struct AppState<T: FetchTransport, S: Sleeper> {
    pub pipeline: Arc<MarketPipeline<T, S>>,
    pub http: reqwest::Client,
}

impl<T: FetchTransport, S: Sleeper> Clone for AppState<T, S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            http: self.http.clone(),
        }
    }
}

impl<T: FetchTransport, S: Sleeper> AppState<T, S> {
    pub fn new(pipeline: MarketPipeline<T, S>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            http: reqwest::Client::new(),
        }
    }
}

/// Build the router over a pipeline state.
pub fn build_app<T, S>(state: AppState<T, S>) -> Router
where
    T: FetchTransport + 'static,
    S: Sleeper + 'static,
{
    Router::new()
        .route("/api/analyze", get(routes::analyze::analyze_handler::<T, S>))
        .route("/image-proxy", get(routes::image_proxy::image_proxy_handler::<T, S>))
        .route("/health", get(routes::health::health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
