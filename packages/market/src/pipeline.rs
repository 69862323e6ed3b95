//! The pipeline orchestrator: the one entry point collaborators call.
//!
//! Composes normalize → build URL → fetch → extract → filter →
//! analyze into a single request/response cycle under an overall
//! deadline. One logical pipeline instance per request; no shared
//! mutable state crosses requests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::analysis;
use crate::cache::ImageCache;
use crate::error::{MarketError, Result};
use crate::extract::{grade, images, ListingExtractor};
use crate::fetch::{FetchTransport, RetryingFetcher, Sleeper, TokioSleeper};
use crate::query;
use crate::types::{AnalysisRequest, AnalysisResponse, Listing};

/// Orchestrator-level knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Overall deadline for one request. Once exceeded, in-flight work
    /// is abandoned and an error surfaces; never partial results.
    pub deadline: Duration,

    /// Bound on concurrent per-listing image enrichment.
    pub enrichment_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(120),
            enrichment_concurrency: 8,
        }
    }
}

/// The full search-to-assessment pipeline.
pub struct MarketPipeline<T: FetchTransport, S: Sleeper = TokioSleeper> {
    fetcher: RetryingFetcher<T, S>,
    extractor: ListingExtractor,
    cache: Option<Arc<ImageCache>>,
    config: PipelineConfig,
}

impl<T: FetchTransport, S: Sleeper> MarketPipeline<T, S> {
    pub fn new(fetcher: RetryingFetcher<T, S>, extractor: ListingExtractor) -> Self {
        Self {
            fetcher,
            extractor,
            cache: None,
            config: PipelineConfig::default(),
        }
    }

    /// Enable image-cache enrichment.
    pub fn with_cache(mut self, cache: Arc<ImageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override orchestrator configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one request/response cycle.
    ///
    /// An empty query is rejected before any work; everything else
    /// runs under the configured deadline.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        if request.query.trim().is_empty() {
            return Err(MarketError::InvalidQuery {
                reason: "query must be non-empty".to_string(),
            });
        }

        let started = Instant::now();
        match tokio::time::timeout(self.config.deadline, self.execute(request)).await {
            Ok(result) => result,
            Err(_) => Err(MarketError::DeadlineExceeded {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }

    async fn execute(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let normalized = query::normalize(&request.query);
        let url = query::build_search_url(&normalized);
        info!(query = %request.query, normalized = %normalized, "pipeline starting");

        let markup = self.fetcher.fetch(&url).await?;

        let extracted = self.extractor.extract(&markup, &url);
        let grade_filter = request.effective_grade().to_string();
        let listings = grade::filter_by_grade(extracted, &grade_filter);

        if let Some(cache) = &self.cache {
            self.enrich_images(cache, &listings).await;
        }

        let result = analysis::analyze(&listings);
        info!(
            count = listings.len(),
            trend = ?result.trend,
            rating = ?result.rating,
            "pipeline complete"
        );

        Ok(AnalysisResponse {
            success: true,
            query: request.query.clone(),
            grade: grade_filter,
            count: listings.len(),
            listings,
            analysis: result,
        })
    }

    /// Warm the image cache for every listing, concurrently but
    /// bounded. Listing order is untouched: enrichment only touches
    /// the cache, and failures are logged, never fatal.
    ///
    /// Proxied image URLs are unwrapped back to their upstream target
    /// first; the cache is keyed by the upstream URL.
    async fn enrich_images(&self, cache: &Arc<ImageCache>, listings: &[Listing]) {
        let urls: Vec<String> = listings
            .iter()
            .filter_map(|l| images::upstream_url(&l.image_url))
            .collect();

        stream::iter(urls)
            .for_each_concurrent(Some(self.config.enrichment_concurrency), |url| {
                let cache = Arc::clone(cache);
                async move {
                    if let Err(e) = cache.ensure_cached(&url).await {
                        warn!(url = %url, error = %e, "image enrichment failed");
                    }
                }
            })
            .await;
    }
}
