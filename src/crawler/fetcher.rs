//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients with the crawler's identifying user agent
//! - GET requests with a per-request timeout
//! - An explicit retry loop with exponential backoff for transient failures
//! - Error classification
//!
//! Each worker owns its own [`Fetcher`] and therefore its own connection pool.

use crate::crawler::rate_limiter::RateLimiter;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Statuses that indicate a transient server-side condition
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Largest response body the fetcher will read
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Why a single request attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    /// The server answered with a non-success status
    Status(u16),
    /// The request did not complete within the timeout
    Timeout,
    /// The connection could not be established
    Connect(String),
    /// The response body could not be read
    Body(String),
    /// Any other request failure (invalid URL, redirect loop, ...)
    Request(String),
    /// The response is not a text document (image, archive, ...)
    UnsupportedContent(String),
    /// The declared body length exceeds [`MAX_BODY_BYTES`]
    TooLarge(u64),
}

impl FetchCause {
    /// Returns true for failure classes worth another attempt
    ///
    /// | Condition | Retried |
    /// |-----------|---------|
    /// | HTTP 429, 500, 502, 503, 504 | yes |
    /// | Timeout, connection error, truncated body | yes |
    /// | Other HTTP status (404, 401, ...) | no |
    /// | Other request errors | no |
    /// | Non-text or oversized body | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status(code) => RETRYABLE_STATUSES.contains(code),
            Self::Timeout | Self::Connect(_) | Self::Body(_) => true,
            Self::Request(_) | Self::UnsupportedContent(_) | Self::TooLarge(_) => false,
        }
    }

    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => match StatusCode::from_u16(*code)
                .ok()
                .and_then(|s| s.canonical_reason())
            {
                Some(reason) => write!(f, "HTTP {} {}", code, reason),
                None => write!(f, "HTTP {}", code),
            },
            Self::Timeout => f.write_str("request timed out"),
            Self::Connect(e) => write!(f, "connection failed: {}", e),
            Self::Body(e) => write!(f, "failed to read body: {}", e),
            Self::Request(e) => write!(f, "request failed: {}", e),
            Self::UnsupportedContent(mime) => write!(f, "unsupported content type {}", mime),
            Self::TooLarge(len) => write!(f, "body of {} bytes exceeds limit", len),
        }
    }
}

/// A page fetch that failed for good
#[derive(Debug, Clone, Error)]
#[error("{cause} (after {attempts} attempt(s))")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
    pub attempts: u32,
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `failed_attempt` (1-based) before trying again
    ///
    /// `base_delay * 2^(failed_attempt - 1)`, capped at `max_delay`.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Full `User-Agent` header value
/// * `timeout` - Whole-request timeout
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrying page fetcher owned by a single worker
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Wraps an already configured client
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Fetches `url` and returns the response body
    ///
    /// The caller takes the first attempt's turn from `pacer` before calling.
    /// Transient failures are retried up to the policy's attempt limit: each
    /// retry sleeps out its exponential backoff and then waits for a new turn
    /// from `pacer`, so retries obey the same spacing as every other request.
    /// Anything else fails immediately.
    pub async fn fetch(&self, url: &str, pacer: &RateLimiter) -> Result<String, FetchError> {
        let mut attempt = 1;

        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    if attempt > 1 {
                        tracing::debug!("Fetched {} after {} attempts", url, attempt);
                    }
                    return Ok(body);
                }
                Err(cause) if cause.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.retry.max_attempts,
                        url,
                        cause,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    pacer.await_turn().await;
                    attempt += 1;
                }
                Err(cause) => {
                    return Err(FetchError {
                        url: url.to_string(),
                        cause,
                        attempts: attempt,
                    });
                }
            }
        }
    }

    /// Performs one GET request
    async fn fetch_once(&self, url: &str) -> Result<String, FetchCause> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchCause::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status.as_u16()));
        }
        check_content(&response)?;

        response
            .text()
            .await
            .map_err(|e| FetchCause::from_reqwest(&e))
    }
}

/// Rejects bodies that cannot contain links or are too large to read
///
/// A missing `Content-Type` is accepted; `text/*` and the XML/XHTML types are
/// the only declared types that are.
fn check_content(response: &Response) -> Result<(), FetchCause> {
    if let Some(len) = response.content_length() {
        if len > MAX_BODY_BYTES {
            return Err(FetchCause::TooLarge(len));
        }
    }

    let Some(value) = response.headers().get(CONTENT_TYPE) else {
        return Ok(());
    };
    let mime = value
        .to_str()
        .unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime.is_empty() || is_text_document(&mime) {
        Ok(())
    } else {
        Err(FetchCause::UnsupportedContent(mime))
    }
}

fn is_text_document(mime: &str) -> bool {
    mime.starts_with("text/")
        || mime == "application/xhtml+xml"
        || mime == "application/xml"
}
