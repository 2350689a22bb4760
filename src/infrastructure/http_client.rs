//! HTTP client for catalog pages with retry, backoff and cancellation
//!
//! Requests run one at a time. Rate limiting (429), server errors (5xx) and transport
//! faults are retried under the configured [`RetryPolicy`]; any other non-200 status
//! makes the page unavailable straight away.

#![allow(clippy::uninlined_format_args)]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::infrastructure::config::ScrapeConfig;
use crate::infrastructure::retry_policy::{FailureClass, RetryPolicy, seconds_to_duration};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Unavailable { status: u16, url: String },

    #[error("Giving up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Fetch cancelled: {url}")]
    Cancelled { url: String },

    #[error("Invalid header value for {header}: {reason}")]
    InvalidHeader { header: &'static str, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Anything that can hand back the markup behind a URL
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP client configuration
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_seconds: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&ScrapeConfig::default())
    }
}

impl From<&ScrapeConfig> for HttpClientConfig {
    fn from(scrape: &ScrapeConfig) -> Self {
        Self {
            user_agent: scrape.user_agent.clone(),
            accept_language: scrape.accept_language.clone(),
            timeout_seconds: scrape.request_timeout_seconds,
        }
    }
}

enum Attempt {
    Body(String),
    Retry(FailureClass, String),
}

pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
    cancellation: CancellationToken,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig, retry: RetryPolicy, cancellation: CancellationToken) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| FetchError::InvalidHeader {
                header: "User-Agent",
                reason: e.to_string(),
            })?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).map_err(|e| FetchError::InvalidHeader {
                header: "Accept-Language",
                reason: e.to_string(),
            })?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            retry,
            cancellation,
        })
    }

    async fn attempt(&self, url: &str) -> Result<Attempt, FetchError> {
        let response = tokio::select! {
            result = self.client.get(url).send() => result,
            _ = self.cancellation.cancelled() => {
                warn!("🛑 HTTP request cancelled for URL: {}", url);
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return Ok(Attempt::Retry(FailureClass::Transport, e.to_string())),
        };

        let status = response.status();
        if let Some(class) = FailureClass::from_status(status.as_u16()) {
            return Ok(Attempt::Retry(class, format!("HTTP {}", status)));
        }
        if status != StatusCode::OK {
            warn!("⚠️ HTTP {} for {}", status, url);
            return Err(FetchError::Unavailable {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = tokio::select! {
            result = response.text() => result,
            _ = self.cancellation.cancelled() => {
                warn!("🛑 Response reading cancelled for URL: {}", url);
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
        };
        match body {
            Ok(text) => Ok(Attempt::Body(text)),
            Err(e) => Ok(Attempt::Retry(FailureClass::Transport, e.to_string())),
        }
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = String::new();
        let last_attempt = *self.retry.attempts().end();

        for attempt in self.retry.attempts() {
            if self.cancellation.is_cancelled() {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }

            debug!("Fetching {} (attempt {}/{})", url, attempt, last_attempt);
            match self.attempt(url).await? {
                Attempt::Body(text) => {
                    debug!("Fetched {} ({} chars)", url, text.len());
                    return Ok(text);
                }
                Attempt::Retry(class, reason) => {
                    last_error = reason;
                    if attempt == last_attempt {
                        break;
                    }
                    let backoff = self.retry.backoff_for(class, attempt);
                    warn!(
                        "⏳ {} on {} ({}), retry {}/{} in {:.0}s",
                        class,
                        url,
                        last_error,
                        attempt,
                        last_attempt,
                        backoff.as_secs_f64()
                    );
                    if !sleep_or_cancel(backoff, &self.cancellation).await {
                        return Err(FetchError::Cancelled { url: url.to_string() });
                    }
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: last_attempt,
            last_error,
        })
    }
}

/// Sleep unless cancelled first; `false` when the token fired
pub async fn sleep_or_cancel(duration: Duration, cancellation: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancellation.is_cancelled();
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancellation.cancelled() => false,
    }
}

/// Politeness delay of `base + U(0, jitter)` seconds between page fetches.
/// A non-positive base skips the delay entirely.
pub async fn polite_sleep(base_seconds: f64, jitter_seconds: f64, cancellation: &CancellationToken) -> bool {
    if base_seconds <= 0.0 {
        return !cancellation.is_cancelled();
    }
    let jitter = fastrand::f64() * jitter_seconds.max(0.0);
    sleep_or_cancel(seconds_to_duration(base_seconds + jitter), cancellation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    /// Local server answering the n-th connection with `script[n]` (the last entry
    /// repeats). Returns the page URL and the connection counter.
    async fn scripted_server(script: Vec<(&'static str, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = script[index.min(script.len() - 1)];
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while let Ok(n) = socket.read(&mut buf).await {
                        if n == 0 {
                            break;
                        }
                        request.extend_from_slice(&buf[..n]);
                        if request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{}/us-en/album/x/1", addr), hits)
    }

    fn quick_client(max_attempts: u32) -> HttpClient {
        let config = HttpClientConfig {
            timeout_seconds: 5,
            ..Default::default()
        };
        HttpClient::new(config, RetryPolicy::immediate(max_attempts), CancellationToken::new()).unwrap()
    }

    #[tokio::test]
    async fn ok_response_returns_the_body() {
        let (url, hits) = scripted_server(vec![("200 OK", "<h1>Album</h1>")]).await;
        let body = assert_ok!(quick_client(3).fetch_page(&url).await);
        assert_eq!(body, "<h1>Album</h1>");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_use_the_whole_budget() {
        let (url, hits) = scripted_server(vec![("503 Service Unavailable", "")]).await;
        let error = assert_err!(quick_client(3).fetch_page(&url).await);
        assert!(matches!(error, FetchError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rate_limiting_is_retried() {
        let (url, hits) = scripted_server(vec![("429 Too Many Requests", ""), ("200 OK", "done")]).await;
        let body = assert_ok!(quick_client(3).fetch_page(&url).await);
        assert_eq!(body, "done");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn not_found_fails_after_one_request() {
        let (url, hits) = scripted_server(vec![("404 Not Found", "missing")]).await;
        let error = assert_err!(quick_client(3).fetch_page(&url).await);
        assert!(matches!(error, FetchError::Unavailable { status: 404, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_statuses_are_not_retried() {
        let (url, hits) = scripted_server(vec![("403 Forbidden", "")]).await;
        let error = assert_err!(quick_client(3).fetch_page(&url).await);
        assert!(matches!(error, FetchError::Unavailable { status: 403, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn client_creation() {
        let client = HttpClient::new(HttpClientConfig::default(), RetryPolicy::default(), CancellationToken::new());
        assert!(client.is_ok());
    }

    #[test]
    fn rejects_unencodable_user_agent() {
        let config = HttpClientConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        };
        let result = HttpClient::new(config, RetryPolicy::default(), CancellationToken::new());
        assert!(matches!(result, Err(FetchError::InvalidHeader { header: "User-Agent", .. })));
    }

    #[tokio::test]
    async fn cancelled_client_does_not_fetch() {
        let token = CancellationToken::new();
        token.cancel();
        let client = HttpClient::new(HttpClientConfig::default(), RetryPolicy::immediate(3), token).unwrap();

        let result = client.fetch_page("http://127.0.0.1:9/never").await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn transport_failures_exhaust_the_budget() {
        let config = HttpClientConfig {
            timeout_seconds: 2,
            ..Default::default()
        };
        let client = HttpClient::new(config, RetryPolicy::immediate(2), CancellationToken::new()).unwrap();

        // Port 9 (discard) is closed on test hosts; the connection is refused
        match client.fetch_page("http://127.0.0.1:9/").await {
            Err(FetchError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }

    #[tokio::test]
    async fn polite_sleep_is_skipped_for_zero_base() {
        let token = CancellationToken::new();
        let started = std::time::Instant::now();
        assert!(polite_sleep(0.0, 5.0, &token).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn polite_sleep_survives_absurd_delays() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(!polite_sleep(1e300, 1e300, &token).await);
    }

    #[tokio::test]
    async fn polite_sleep_stops_on_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(!polite_sleep(30.0, 0.0, &token).await);
    }
}
