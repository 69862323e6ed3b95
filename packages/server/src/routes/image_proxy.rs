//! Referrer/CORS-bypassing image proxy.
//!
//! Listing thumbnails live on hosts that refuse hotlinked requests;
//! the extractor rewrites those URLs to point here, and this handler
//! streams the upstream bytes through with content-type and length
//! preserved.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use market::fetch::{FetchTransport, Sleeper};
use serde::Deserialize;
use tracing::warn;

use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: String,
}

/// `GET /image-proxy?url=<encoded>`
pub async fn image_proxy_handler<T, S>(
    State(state): State<AppState<T, S>>,
    Query(params): Query<ProxyParams>,
) -> Response
where
    T: FetchTransport + 'static,
    S: Sleeper + 'static,
{
    if !params.url.starts_with("http://") && !params.url.starts_with("https://") {
        return (StatusCode::BAD_REQUEST, "url must be http(s)").into_response();
    }

    let upstream = match state.http.get(&params.url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %params.url, error = %e, "image proxy upstream request failed");
            return (StatusCode::BAD_GATEWAY, "upstream request failed").into_response();
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        warn!(url = %params.url, status = %status, "image proxy upstream non-success");
        return (StatusCode::BAD_GATEWAY, "upstream returned an error").into_response();
    }

    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(content_type) = upstream.headers().get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(content_length) = upstream.headers().get(header::CONTENT_LENGTH) {
        builder = builder.header(header::CONTENT_LENGTH, content_length);
    }

    match builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "image proxy response assembly failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "proxy failure").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use market::fetch::RetryPolicy;
    use market::testing::{MockTransport, NoopSleeper};
    use market::{ListingExtractor, MarketPipeline, RetryingFetcher};
    use tower::ServiceExt;

    use crate::app::{build_app, AppState};

    fn app() -> axum::Router {
        let pipeline = MarketPipeline::new(
            RetryingFetcher::with_policy(MockTransport::new(), RetryPolicy::default(), NoopSleeper),
            ListingExtractor::default(),
        );
        build_app(AppState::new(pipeline))
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let response = app()
            .oneshot(
                Request::get("/image-proxy?url=file%3A%2F%2F%2Fetc%2Fpasswd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_missing_url() {
        let response = app()
            .oneshot(Request::get("/image-proxy").body(Body::empty()).unwrap())
            .await
            .unwrap();
        // Query extraction fails without the parameter.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
