//! Fetching with bounded retries and jittered backoff.
//!
//! The network sits behind the [`FetchTransport`] trait so the retry
//! logic (and everything above it) can be tested without sockets.
//! [`RetryingFetcher`] is the sole network I/O boundary of the
//! pipeline: every other component is a deterministic transformation
//! over its output.

mod retry;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub use retry::{RetryPolicy, Sleeper, TokioSleeper};

use crate::error::{FetchError, FetchResult};

/// One attempt's worth of HTTP response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Transport seam for a single HTTP GET attempt.
///
/// Implementations: [`HttpTransport`] (reqwest) and
/// `testing::MockTransport` (scripted responses).
#[async_trait]
pub trait FetchTransport: Send + Sync {
    async fn get(&self, url: &str) -> FetchResult<FetchResponse>;
}

/// reqwest-backed transport sending a realistic browser header set.
///
/// Marketplace search pages answer differently (or not at all) to
/// obvious bot traffic, so the defaults mimic a desktop browser.
pub struct HttpTransport {
    client: reqwest::Client,
    user_agent: String,
}

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

impl HttpTransport {
    /// Create a transport with the given per-attempt request timeout.
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(request_timeout)
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl FetchTransport for HttpTransport {
    async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Transport {
                        url: url.to_string(),
                        source: Box::new(e),
                    }
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: Box::new(e),
        })?;

        Ok(FetchResponse { status, body })
    }
}

/// Fetcher that wraps a transport with the retry policy.
///
/// Attempts are strictly sequential per URL; before each attempt the
/// policy's jittered delay is slept, which smooths load on the
/// marketplace and reduces detection as automated traffic.
pub struct RetryingFetcher<T: FetchTransport, S: Sleeper = TokioSleeper> {
    transport: T,
    policy: RetryPolicy,
    sleeper: S,
}

impl<T: FetchTransport> RetryingFetcher<T> {
    /// Create a fetcher with the default policy and tokio sleeps.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            sleeper: TokioSleeper,
        }
    }
}

impl RetryingFetcher<HttpTransport> {
    /// HTTP fetcher whose transport timeout comes from the policy.
    pub fn over_http(policy: RetryPolicy) -> Self {
        Self {
            transport: HttpTransport::new(policy.request_timeout),
            policy,
            sleeper: TokioSleeper,
        }
    }
}

impl<T: FetchTransport, S: Sleeper> RetryingFetcher<T, S> {
    /// Create a fetcher with an explicit policy and sleeper.
    pub fn with_policy(transport: T, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            transport,
            policy,
            sleeper,
        }
    }

    /// The wrapped transport (used by tests to assert on calls).
    pub fn transport_ref(&self) -> &T {
        &self.transport
    }

    /// Fetch a URL, retrying per the policy.
    ///
    /// An attempt succeeds only on HTTP 200; any other status or
    /// transport error is logged and retried. Once attempts are
    /// exhausted the final attempt's error propagates verbatim.
    pub async fn fetch(&self, url: &str) -> FetchResult<String> {
        let mut last_err = None;

        for attempt in 1..=self.policy.max_attempts {
            self.sleeper.sleep(self.policy.next_delay()).await;

            debug!(url = %url, attempt, "fetch attempt starting");
            match self.transport.get(url).await {
                Ok(response) if response.status == 200 => {
                    debug!(url = %url, attempt, bytes = response.body.len(), "fetch succeeded");
                    return Ok(response.body);
                }
                Ok(response) => {
                    warn!(
                        url = %url,
                        attempt,
                        status = response.status,
                        "fetch got non-200 status, will retry"
                    );
                    last_err = Some(FetchError::Status {
                        status: response.status,
                        url: url.to_string(),
                    });
                }
                Err(e) => {
                    warn!(url = %url, attempt, error = %e, "fetch attempt failed, will retry");
                    last_err = Some(e);
                }
            }
        }

        // max_attempts >= 1, so at least one attempt ran and set this.
        Err(last_err.unwrap_or_else(|| FetchError::Timeout {
            url: url.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, NoopSleeper};

    fn fetcher(transport: MockTransport) -> RetryingFetcher<MockTransport, NoopSleeper> {
        RetryingFetcher::with_policy(transport, RetryPolicy::default(), NoopSleeper)
    }

    #[tokio::test]
    async fn first_attempt_success_does_not_retry() {
        let transport = MockTransport::new().with_response(200, "<html>ok</html>");
        let fetcher = fetcher(transport);

        let body = fetcher.fetch("https://example.com/search").await.unwrap();
        assert_eq!(body, "<html>ok</html>");
        assert_eq!(fetcher.transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn retries_after_server_errors_then_succeeds() {
        let transport = MockTransport::new()
            .with_response(503, "busy")
            .with_response(503, "busy")
            .with_response(200, "payload");
        let fetcher = fetcher(transport);

        let body = fetcher.fetch("https://example.com/search").await.unwrap();
        assert_eq!(body, "payload");
        assert_eq!(fetcher.transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_propagate_final_error() {
        let transport = MockTransport::new()
            .with_response(500, "")
            .with_response(502, "")
            .with_response(429, "slow down");
        let fetcher = fetcher(transport);

        let err = fetcher.fetch("https://example.com/search").await.unwrap_err();
        match err {
            FetchError::Status { status, .. } => assert_eq!(status, 429),
            other => panic!("expected status error, got {other:?}"),
        }
        assert_eq!(fetcher.transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn transport_error_is_retried() {
        let transport = MockTransport::new()
            .with_error("connection reset")
            .with_response(200, "recovered");
        let fetcher = fetcher(transport);

        let body = fetcher.fetch("https://example.com/search").await.unwrap();
        assert_eq!(body, "recovered");
        assert_eq!(fetcher.transport.calls().len(), 2);
    }
}
