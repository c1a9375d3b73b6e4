//! Robots.txt handling module
//!
//! The policy is fetched once per crawl, before any worker starts, and is
//! read-only afterwards. A robots.txt that cannot be retrieved, for whatever
//! reason, resolves to [`RobotsPolicy::AllowAll`] instead of failing the crawl.

mod parser;

pub use parser::ParsedRobots;

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Reasons a robots.txt could not be used; always recovered to allow-all
#[derive(Debug, Error)]
pub enum RobotsLoadError {
    #[error("robots.txt request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("robots.txt returned HTTP {0}")]
    Status(u16),

    #[error("cannot derive robots.txt location from {0}")]
    NoRobotsUrl(String),
}

/// Crawl-permission policy for the crawled site
#[derive(Debug, Clone)]
pub enum RobotsPolicy {
    /// No usable robots.txt: every URL may be fetched
    AllowAll,

    /// Rules parsed from robots.txt, evaluated for one user-agent token
    Rules {
        robots: ParsedRobots,
        user_agent: String,
    },
}

impl RobotsPolicy {
    /// Builds a rule-based policy from raw robots.txt content
    pub fn from_content(content: &str, user_agent: &str) -> Self {
        Self::Rules {
            robots: ParsedRobots::from_content(content),
            user_agent: user_agent.to_string(),
        }
    }

    /// Checks whether the crawler may fetch `url`
    ///
    /// Pure lookup: no I/O and no shared mutable state.
    pub fn is_allowed(&self, url: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::Rules { robots, user_agent } => robots.is_allowed(url, user_agent),
        }
    }

    /// Crawl delay requested for the crawler's user agent, if any
    pub fn crawl_delay(&self) -> Option<Duration> {
        match self {
            Self::AllowAll => None,
            Self::Rules { robots, user_agent } => robots
                .crawl_delay(user_agent)
                .map(Duration::from_secs_f64),
        }
    }
}

/// Returns the robots.txt location for the site hosting `url`
///
/// `<scheme>://<host>[:port]/robots.txt`, independent of the seed's path.
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    url.join("/robots.txt").ok()
}

/// Loads the robots policy for the site hosting `seed`
///
/// # Arguments
///
/// * `client` - HTTP client (with its own timeout) used for the single request
/// * `seed` - The crawl's seed URL
/// * `user_agent` - The crawler's robots.txt product token
///
/// # Returns
///
/// The parsed policy, or [`RobotsPolicy::AllowAll`] when robots.txt is
/// unreachable, denied (401/403) or otherwise unavailable.
pub async fn load_policy(client: &Client, seed: &Url, user_agent: &str) -> RobotsPolicy {
    match fetch_robots(client, seed).await {
        Ok(content) => {
            tracing::info!("Loaded robots.txt ({} bytes)", content.len());
            RobotsPolicy::from_content(&content, user_agent)
        }
        Err(RobotsLoadError::Status(code @ (401 | 403))) => {
            tracing::info!("robots.txt access denied (HTTP {}), allowing all", code);
            RobotsPolicy::AllowAll
        }
        Err(e) => {
            tracing::warn!("{}, allowing all", e);
            RobotsPolicy::AllowAll
        }
    }
}

/// Fetches the raw robots.txt body for the site hosting `seed`
pub async fn fetch_robots(client: &Client, seed: &Url) -> Result<String, RobotsLoadError> {
    let location =
        robots_url(seed).ok_or_else(|| RobotsLoadError::NoRobotsUrl(seed.to_string()))?;

    tracing::debug!("Fetching {}", location);
    let response = client.get(location).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(RobotsLoadError::Status(status.as_u16()));
    }

    Ok(response.text().await?)
}
