//! Request-scoped value types shared across the pipeline.
//!
//! Everything here is a plain serde-serializable value object; identity
//! assignment and persistence belong to the consuming service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::extract::grade::GradeInfo;

/// One structured sale record derived from a marketplace search result
/// fragment.
///
/// Constructed only by the listing extractor and immutable thereafter.
/// Invariant: `total_price == price + shipping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Listing title as shown on the marketplace.
    pub title: String,

    /// Sale price, excluding shipping.
    pub price: f64,

    /// Shipping cost; 0 for free or unlisted shipping.
    pub shipping: f64,

    /// `price + shipping`, computed, never independently extracted.
    pub total_price: f64,

    /// When the sale ended. Falls back to the extraction time when the
    /// marketplace gives no parseable date.
    pub date_sold: DateTime<Utc>,

    /// Resolved image URL (may point at the image proxy).
    pub image_url: String,

    /// Detected grading info; `None` means a raw (ungraded) card.
    pub grade: Option<GradeInfo>,

    /// Card number from a `#NNN` marker in the title, or empty.
    pub card_number: String,

    /// The search URL this listing was extracted from.
    pub source_url: String,
}

/// A request into the pipeline orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    /// Free-text card description. Must be non-empty.
    pub query: String,

    /// Grade filter, e.g. "PSA 10", "raw", or "any".
    #[serde(default = "default_grade")]
    pub grade: String,

    /// Shorthand for `grade == "raw"`.
    #[serde(default)]
    pub raw: bool,
}

fn default_grade() -> String {
    "any".to_string()
}

impl AnalysisRequest {
    /// Create a request with the default "any" grade filter.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            grade: default_grade(),
            raw: false,
        }
    }

    /// Set the grade filter.
    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = grade.into();
        self
    }

    /// Restrict to raw (ungraded) listings.
    pub fn raw_only(mut self) -> Self {
        self.raw = true;
        self
    }

    /// The effective grade filter, folding the `raw` flag in.
    pub fn effective_grade(&self) -> &str {
        if self.raw {
            "raw"
        } else {
            &self.grade
        }
    }
}

/// The pipeline's answer for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    pub query: String,
    pub grade: String,
    pub count: usize,
    pub listings: Vec<Listing>,
    pub analysis: AnalysisResult,
}
