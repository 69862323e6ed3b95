//! Sold-listing retrieval, extraction and market analysis for
//! collectible cards.
//!
//! The pipeline ingests a free-text card description, fetches the
//! marketplace's completed/sold search results for it, extracts
//! structured sale records from the (heuristic, unversioned) markup,
//! and produces a statistical market assessment: price trend,
//! volatility, liquidity, and an investment rating.
//!
//! # Usage
//!
//! ```rust,ignore
//! use market::{
//!     AnalysisRequest, HttpTransport, ListingExtractor, MarketPipeline, RetryingFetcher,
//! };
//!
//! let pipeline = MarketPipeline::new(
//!     RetryingFetcher::new(HttpTransport::default()),
//!     ListingExtractor::default(),
//! );
//! let response = pipeline
//!     .run(&AnalysisRequest::new("Justin Jefferson 2020 Prizm PSA 10 #398"))
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`query`] - query normalization and search URL construction
//! - [`fetch`] - retrying fetcher over a pluggable transport
//! - [`extract`] - listing extraction, grade detection, image resolution
//! - [`analysis`] - trend/volatility/liquidity/rating computation
//! - [`pipeline`] - the orchestrator collaborators call
//! - [`cache`] - check-then-write image cache for enrichment
//! - [`testing`] - scripted transport and fixture builders

pub mod analysis;
pub mod cache;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod query;
pub mod testing;
pub mod types;

// Re-export core types at crate root
pub use analysis::{analyze, AnalysisResult, Rating, Trend};
pub use cache::ImageCache;
pub use error::{CacheError, FetchError, MarketError};
pub use extract::{
    grade::{detect_card_number, detect_grade, filter_by_grade, GradeInfo, GradingService},
    images::ImageResolver,
    ExtractorConfig, ListingExtractor,
};
pub use fetch::{FetchTransport, HttpTransport, RetryPolicy, RetryingFetcher, Sleeper, TokioSleeper};
pub use pipeline::{MarketPipeline, PipelineConfig};
pub use query::{build_search_url, normalize};
pub use types::{AnalysisRequest, AnalysisResponse, Listing};
