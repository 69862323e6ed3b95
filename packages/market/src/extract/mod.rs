//! Listing extraction from fetched search-result markup.
//!
//! One pass per call; a malformed fragment is logged and skipped,
//! never an error. The whole module is best-effort by contract: the
//! upstream markup is third-party and unversioned.

pub mod dates;
pub mod grade;
pub mod images;
pub mod markup;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::Listing;
use markup::{AttrSelector, ClassSelector};

/// Extraction rules as declarative patterns over the markup layer.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Class of a candidate listing container.
    pub container_class: String,

    /// Class of the title element.
    pub title_class: String,

    /// Class of the price element.
    pub price_class: String,

    /// Classes tried in order for the shipping/fee text.
    pub shipping_classes: Vec<String>,

    /// Classes tried in order for the date signal, before the generic
    /// "Sold"/"Ended" text-node scan.
    pub date_classes: Vec<String>,

    /// Titles that mark promotional non-item fragments.
    pub placeholder_titles: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            container_class: "s-item".to_string(),
            title_class: "s-item__title".to_string(),
            price_class: "s-item__price".to_string(),
            shipping_classes: vec![
                "s-item__shipping".to_string(),
                "s-item__logisticsCost".to_string(),
            ],
            date_classes: vec![
                "s-item__listingDate".to_string(),
                "s-item__endedDate".to_string(),
                "s-item__caption--signal".to_string(),
                "s-item__time-left".to_string(),
            ],
            placeholder_titles: vec!["Shop on eBay".to_string()],
        }
    }
}

/// Extracts structured [`Listing`] records from search-result markup.
pub struct ListingExtractor {
    container: ClassSelector,
    title: ClassSelector,
    price: ClassSelector,
    shipping: Vec<ClassSelector>,
    dates: Vec<ClassSelector>,
    image: AttrSelector,
    placeholder_titles: Vec<String>,
    resolver: images::ImageResolver,
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default(), images::ImageResolver::new())
    }
}

impl ListingExtractor {
    pub fn new(config: ExtractorConfig, resolver: images::ImageResolver) -> Self {
        Self {
            container: ClassSelector::new(&config.container_class),
            title: ClassSelector::new(&config.title_class),
            price: ClassSelector::new(&config.price_class),
            shipping: config
                .shipping_classes
                .iter()
                .map(|c| ClassSelector::new(c))
                .collect(),
            dates: config
                .date_classes
                .iter()
                .map(|c| ClassSelector::new(c))
                .collect(),
            image: AttrSelector::new("img", "src"),
            placeholder_titles: config.placeholder_titles,
            resolver,
        }
    }

    /// Extract every parseable listing from a results page.
    ///
    /// Returns whatever subset of fragments parsed successfully, which
    /// may be empty; extraction itself never fails.
    pub fn extract(&self, html: &str, source_url: &str) -> Vec<Listing> {
        self.extract_at(html, source_url, Utc::now())
    }

    /// Like [`extract`](Self::extract) with an explicit clock, so
    /// relative-date handling is deterministic under test.
    pub fn extract_at(&self, html: &str, source_url: &str, now: DateTime<Utc>) -> Vec<Listing> {
        let fragments = markup::split_fragments(html, &self.container);
        let mut listings = Vec::with_capacity(fragments.len());

        for fragment in fragments {
            match self.parse_fragment(fragment, source_url, now) {
                Some(listing) => listings.push(listing),
                None => debug!("skipping unparseable or non-item fragment"),
            }
        }

        debug!(
            count = listings.len(),
            source = %source_url,
            "listing extraction complete"
        );
        listings
    }

    fn parse_fragment(
        &self,
        fragment: &str,
        source_url: &str,
        now: DateTime<Utc>,
    ) -> Option<Listing> {
        let title = self.title.first_text(fragment)?;
        if self
            .placeholder_titles
            .iter()
            .any(|p| title.eq_ignore_ascii_case(p))
        {
            // Promotional entry, not a sale. Normal filtering outcome.
            return None;
        }

        let price_text = self.price.first_text(fragment)?;
        let price = parse_money(&price_text)?;

        let shipping = self
            .shipping
            .iter()
            .find_map(|sel| sel.first_text(fragment))
            .map(|text| parse_shipping(&text))
            .unwrap_or(0.0);

        let date_text = self
            .dates
            .iter()
            .find_map(|sel| sel.first_text(fragment))
            .or_else(|| {
                markup::text_nodes(fragment)
                    .into_iter()
                    .find(|node| node.contains("Sold") || node.contains("Ended"))
            });
        let date_sold = match date_text {
            Some(text) => dates::interpret(&text, now),
            None => now,
        };

        let raw_image = self.image.first_value(fragment).unwrap_or_default();
        let image_url = if raw_image.is_empty() {
            raw_image
        } else {
            self.resolver.resolve(&title, &raw_image)
        };

        Some(Listing {
            grade: grade::detect_grade(&title),
            card_number: grade::detect_card_number(&title),
            image_url,
            total_price: price + shipping,
            price,
            shipping,
            date_sold,
            title,
            source_url: source_url.to_string(),
        })
    }
}

/// Parse a price by stripping everything but digits and the decimal
/// point. Unparseable remainders (empty, ranges) yield `None`.
fn parse_money(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok().filter(|p| *p >= 0.0)
}

/// Shipping is forgiving: free or unparseable text is 0, never a
/// reason to discard the listing.
fn parse_shipping(text: &str) -> f64 {
    if text.to_lowercase().contains("free") {
        return 0.0;
    }
    parse_money(text).unwrap_or(0.0)
}
