//! HTTP surface over the market analysis pipeline.
//!
//! Three routes: `/api/analyze` runs the pipeline per request,
//! `/image-proxy` streams remote listing images past referrer
//! restrictions, `/health` is liveness.

pub mod app;
pub mod routes;

pub use app::{build_app, AppState};
