//! Robots.txt rule evaluation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate; the
//! Crawl-delay directive, which that crate does not expose, is parsed here.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// The raw content is kept and matched on demand: the matcher is cheap to
/// construct and holds per-query state, so nothing mutable is shared between
/// workers.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The crawler's product token
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A group naming the agent takes precedence over the `*` group.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no crawl delay applies
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let mut group_agents: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut delay_for_wildcard: Option<f64> = None;
        let mut delay_for_agent: Option<f64> = None;

        let normalized_agent = user_agent.to_lowercase();

        for line in self.content.lines() {
            // Strip trailing comments
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // Consecutive User-agent lines share one group
                if !in_agent_lines {
                    group_agents.clear();
                }
                group_agents.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }

            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };
            if !delay.is_finite() || delay < 0.0 {
                continue;
            }

            if group_agents
                .iter()
                .any(|ua| !ua.is_empty() && ua != "*" && normalized_agent.contains(ua.as_str()))
            {
                delay_for_agent = Some(delay);
            } else if group_agents.iter().any(|ua| ua == "*") {
                delay_for_wildcard = Some(delay);
            }
        }

        delay_for_agent.or(delay_for_wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com";

    fn url(path: &str) -> String {
        format!("{}{}", BASE, path)
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed(&url("/"), "TestBot"));
        assert!(!robots.is_allowed(&url("/page"), "TestBot"));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin");
        assert!(robots.is_allowed(&url("/"), "TestBot"));
        assert!(robots.is_allowed(&url("/page"), "TestBot"));
        assert!(!robots.is_allowed(&url("/admin"), "TestBot"));
        assert!(!robots.is_allowed(&url("/admin/users"), "TestBot"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let robots =
            ParsedRobots::from_content("User-agent: *\nDisallow: /private\nAllow: /private/public");
        assert!(robots.is_allowed(&url("/"), "TestBot"));
        assert!(!robots.is_allowed(&url("/private"), "TestBot"));
        assert!(robots.is_allowed(&url("/private/public"), "TestBot"));
    }

    #[test]
    fn test_parse_specific_user_agent() {
        let robots = ParsedRobots::from_content("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(robots.is_allowed(&url("/page"), "GoodBot"));
        assert!(!robots.is_allowed(&url("/page"), "BadBot"));
    }

    #[test]
    fn test_garbage_content_allows() {
        let robots = ParsedRobots::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed(&url("/any/path"), "TestBot"));
    }

    #[test]
    fn test_empty_robots_txt() {
        let robots = ParsedRobots::from_content("   \n");
        assert!(robots.is_allowed(&url("/any/path"), "TestBot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), Some(10.0));
        assert_eq!(robots.crawl_delay("AnyBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_specific_agent() {
        let robots =
            ParsedRobots::from_content("User-agent: TestBot\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10");
        assert_eq!(robots.crawl_delay("TestBot"), Some(5.0));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_directive_after_disallow() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /tmp\nCrawl-delay: 2");
        assert_eq!(robots.crawl_delay("TestBot"), Some(2.0));
    }

    #[test]
    fn test_crawl_delay_no_delay() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }

    #[test]
    fn test_crawl_delay_decimal_and_comment() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 2.5 # be nice");
        assert_eq!(robots.crawl_delay("TestBot"), Some(2.5));
    }

    #[test]
    fn test_crawl_delay_case_insensitive() {
        let robots = ParsedRobots::from_content("User-agent: TestBot\ncrawl-delay: 7");
        assert_eq!(robots.crawl_delay("testbot"), Some(7.0));
        assert_eq!(robots.crawl_delay("TESTBOT"), Some(7.0));
    }

    #[test]
    fn test_crawl_delay_multiple_user_agents() {
        let robots = ParsedRobots::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("BotA"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotB"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_negative_ignored() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: -4");
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }
}
