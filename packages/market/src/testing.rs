//! Testing utilities: scripted transport, no-op sleeper, and fixture
//! builders.
//!
//! Useful for testing code built on the pipeline without sockets or
//! real timers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::error::{FetchError, FetchResult};
use crate::fetch::{FetchResponse, FetchTransport, Sleeper};
use crate::types::Listing;

/// A transport that replays scripted responses and records calls.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Scripted>>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

enum Scripted {
    Response(FetchResponse),
    Error(String),
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next response.
    pub fn with_response(self, status: u16, body: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Scripted::Response(FetchResponse {
            status,
            body: body.into(),
        }));
        self
    }

    /// Script the next attempt to fail at the transport level.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Error(message.into()));
        self
    }

    /// Delay every attempt (for deadline tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchTransport for MockTransport {
    async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.responses.lock().unwrap().pop_front();
        match scripted {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Error(message)) => Err(FetchError::Transport {
                url: url.to_string(),
                source: Box::new(std::io::Error::other(message)),
            }),
            None => Err(FetchError::Transport {
                url: url.to_string(),
                source: Box::new(std::io::Error::other("no scripted response left")),
            }),
        }
    }
}

/// Sleeper that returns immediately, so retry tests run instantly.
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// A listing with the given title and placeholder sale data.
pub fn listing_with_title(title: &str) -> Listing {
    listing(title, 10.0, fixed_date())
}

/// A listing sold at a given total price and date.
pub fn listing_sold_at(price: f64, date_sold: DateTime<Utc>) -> Listing {
    listing("Test Card", price, date_sold)
}

fn listing(title: &str, price: f64, date_sold: DateTime<Utc>) -> Listing {
    Listing {
        title: title.to_string(),
        price,
        shipping: 0.0,
        total_price: price,
        date_sold,
        image_url: String::new(),
        grade: None,
        card_number: String::new(),
        source_url: "https://example.com/search".to_string(),
    }
}

fn fixed_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap()
}

/// One search-result fragment in the marketplace's markup shape.
/// Empty strings omit the corresponding element.
pub fn fixture_item(title: &str, price: &str, shipping: &str, date: &str, image: &str) -> String {
    let mut item = String::from(r#"<li class="s-item">"#);
    if !image.is_empty() {
        item.push_str(&format!(r#"<div class="s-item__image"><img src="{image}"></div>"#));
    }
    item.push_str(&format!(r#"<span class="s-item__title">{title}</span>"#));
    if !date.is_empty() {
        item.push_str(&format!(
            r#"<span class="s-item__caption--signal POSITIVE">{date}</span>"#
        ));
    }
    item.push_str(&format!(r#"<span class="s-item__price">{price}</span>"#));
    if !shipping.is_empty() {
        item.push_str(&format!(r#"<span class="s-item__shipping">{shipping}</span>"#));
    }
    item.push_str("</li>");
    item
}

/// A full results page wrapping the given fragments.
pub fn fixture_page(items: &[String]) -> String {
    format!(
        r#"<html><body><ul class="srp-results">{}</ul></body></html>"#,
        items.concat()
    )
}
