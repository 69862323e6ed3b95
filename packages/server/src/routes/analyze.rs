//! The analysis endpoint: one pipeline run per request.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use market::fetch::{FetchTransport, Sleeper};
use market::{AnalysisRequest, MarketError};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_grade")]
    pub grade: String,
    #[serde(default)]
    pub raw: bool,
}

fn default_grade() -> String {
    "any".to_string()
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.into(),
        }),
    )
        .into_response()
}

/// `GET /api/analyze?query=..&grade=..&raw=..`
///
/// 400 for a missing/empty query; 200 with `success: true` on normal
/// completion (the InsufficientData sentinel included, it is not an
/// error); 500 with `success: false` for fetch failures or anything
/// unexpected.
pub async fn analyze_handler<T, S>(
    State(state): State<AppState<T, S>>,
    Query(params): Query<AnalyzeParams>,
) -> Response
where
    T: FetchTransport + 'static,
    S: Sleeper + 'static,
{
    if params.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "query parameter is required");
    }

    let mut request = AnalysisRequest::new(params.query).with_grade(params.grade);
    if params.raw {
        request = request.raw_only();
    }

    match state.pipeline.run(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e @ MarketError::InvalidQuery { .. }) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            error!(error = %e, "pipeline run failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
