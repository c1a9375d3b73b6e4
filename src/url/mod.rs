//! URL handling for the crawl
//!
//! Scope is a plain string-prefix rule against the seed URL, and discovered
//! hrefs are resolved against the directory of the page they were found on.
//! Neither step performs full URL normalization.
//!
//! The seed is parsed once, which lowercases the host and adds a root `/`.
//! Resolved hrefs come out in that parsed form, while absolute hrefs in the
//! seed's scheme are kept exactly as written. The scope therefore matches
//! against the parsed seed and, when it differs, against the seed string as
//! configured.

mod resolve;

pub use resolve::{directory_url, resolve_href};

use url::Url;

/// The set of URLs a crawl is allowed to visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    prefix: String,
    configured: Option<String>,
    scheme: String,
}

impl CrawlScope {
    /// Builds the scope rooted at `seed`
    pub fn new(seed: &Url) -> Self {
        Self {
            prefix: seed.as_str().to_string(),
            configured: None,
            scheme: seed.scheme().to_string(),
        }
    }

    /// Also accepts URLs starting with the seed exactly as the user wrote it
    ///
    /// Ignored unless `configured` parses to the same URL as the scope's
    /// seed and has a path after its host. Without a path, `https://x.test`
    /// would also match `https://x.test.evil/`.
    pub fn with_configured_seed(mut self, configured: &str) -> Self {
        let configured = configured.trim();
        let same_seed = Url::parse(configured).is_ok_and(|url| url.as_str() == self.prefix);
        let has_path = configured
            .split_once("://")
            .is_some_and(|(_, rest)| rest.contains('/'));

        if configured != self.prefix && same_seed && has_path {
            self.configured = Some(configured.to_string());
        }
        self
    }

    /// Returns true iff `url` starts with the seed URL, parsed or as configured
    pub fn contains(&self, url: &str) -> bool {
        url.starts_with(&self.prefix)
            || self
                .configured
                .as_deref()
                .is_some_and(|configured| url.starts_with(configured))
    }

    /// The seed URL used as prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Scheme of the seed URL; hrefs already in this scheme are kept verbatim
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Resolves `href` found on `page_url` and keeps it only if in scope
    pub fn resolve_in_scope(&self, page_url: &str, href: &str) -> Option<String> {
        resolve_href(page_url, href, &self.scheme).filter(|absolute| self.contains(absolute))
    }
}
