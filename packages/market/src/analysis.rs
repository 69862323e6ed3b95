//! Statistical market assessment over extracted sale records.
//!
//! Trend comes from an ordinary-least-squares regression of price on
//! an integer day axis; volatility is the coefficient of variation of
//! prices; liquidity is sales per day over the observed span; the
//! investment rating folds all three through a fixed precedence table.
//! Pure functions of the input snapshot, no randomness.

use serde::Serialize;
use tracing::debug;

use crate::types::Listing;

/// Coarse price-direction classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Upward,
    Downward,
    Stable,
    InsufficientData,
}

/// Coarse buy/hold/avoid label derived from trend, volatility and
/// liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    StrongBuy,
    Hold,
    Avoid,
    Speculative,
    Unknown,
}

/// Result of one analysis call. Produced once from a snapshot of
/// listings; never mutated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub trend: Trend,
    pub volatility: Option<f64>,
    pub liquidity: Option<f64>,
    pub rating: Rating,
}

impl AnalysisResult {
    /// The defined sentinel outcome for under 3 valid pairs. Not an
    /// error.
    pub fn insufficient_data() -> Self {
        Self {
            trend: Trend::InsufficientData,
            volatility: None,
            liquidity: None,
            rating: Rating::Unknown,
        }
    }
}

const MIN_VALID_PAIRS: usize = 3;
const SLOPE_THRESHOLD: f64 = 0.5;

/// Analyze a snapshot of listings.
pub fn analyze(listings: &[Listing]) -> AnalysisResult {
    // Total price preferentially, bare price as fallback; a pair is
    // valid only with a positive price.
    let mut pairs: Vec<(f64, chrono::DateTime<chrono::Utc>)> = listings
        .iter()
        .filter_map(|l| {
            let price = if l.total_price > 0.0 {
                l.total_price
            } else {
                l.price
            };
            (price > 0.0).then_some((price, l.date_sold))
        })
        .collect();

    if pairs.len() < MIN_VALID_PAIRS {
        debug!(valid_pairs = pairs.len(), "insufficient data for analysis");
        return AnalysisResult::insufficient_data();
    }

    pairs.sort_by_key(|(_, date)| *date);

    let first_date = pairs[0].1;
    let days: Vec<f64> = pairs
        .iter()
        .map(|(_, date)| (*date - first_date).num_days() as f64)
        .collect();
    let prices: Vec<f64> = pairs.iter().map(|(price, _)| *price).collect();

    let slope = ols_slope(&days, &prices);
    let trend = if slope > SLOPE_THRESHOLD {
        Trend::Upward
    } else if slope < -SLOPE_THRESHOLD {
        Trend::Downward
    } else {
        Trend::Stable
    };

    let n = prices.len() as f64;
    let mean = prices.iter().sum::<f64>() / n;
    let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    let volatility = round2(variance.sqrt() / mean);

    let total_days = ((pairs[pairs.len() - 1].1 - first_date).num_days().max(1)) as f64;
    let liquidity = round2(n / total_days);

    let rating = derive_rating(trend, volatility, liquidity);

    debug!(?trend, slope, volatility, liquidity, ?rating, "analysis complete");
    AnalysisResult {
        trend,
        volatility: Some(volatility),
        liquidity: Some(liquidity),
        rating,
    }
}

/// Ordinary least-squares slope of y regressed on x.
fn ols_slope(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        // All sales on the same day; no time axis to regress over.
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Rating precedence table; the first matching rule wins.
fn derive_rating(trend: Trend, volatility: f64, liquidity: f64) -> Rating {
    if trend == Trend::Upward && volatility < 0.3 && liquidity > 0.2 {
        return Rating::StrongBuy;
    }
    if trend == Trend::Stable && volatility < 0.5 {
        return Rating::Hold;
    }
    if trend == Trend::Downward && volatility > 0.4 {
        return Rating::Avoid;
    }
    Rating::Speculative
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
