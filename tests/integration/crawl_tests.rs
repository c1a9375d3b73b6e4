//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use webcrawler::config::Config;
use webcrawler::crawler::run_crawl;
use webcrawler::output::{emit_report, file_sinks};
use webcrawler::{Coordinator, CrawlReport};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a fast test configuration crawling from `seed`
fn create_test_config(seed: &str) -> Config {
    let mut config = Config::for_seed(seed);
    config.crawler.workers = 3;
    config.crawler.politeness_delay_ms = 0;
    config.crawler.request_timeout_secs = 5;
    config.crawler.retry_backoff_ms = 5;
    config.crawler.idle_timeout_ms = 200;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config
}

/// Mounts an HTML page at `route` linking to `hrefs`, expected to be fetched once
async fn mount_page(server: &MockServer, route: &str, hrefs: &[&str]) {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<html><body>{}</body></html>", anchors))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn page_urls(report: &CrawlReport) -> Vec<String> {
    let mut urls: Vec<_> = report.pages.iter().map(|p| p.url.clone()).collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"),
    )
    .await;

    mount_page(&server, "/", &["a.html", "b.html", "https://elsewhere.test/"]).await;
    mount_page(&server, "/a.html", &["/", "b.html"]).await;
    mount_page(&server, "/b.html", &["a.html#top"]).await;

    let report = run_crawl(create_test_config(&format!("{}/", base)))
        .await
        .expect("crawl should succeed");

    assert_eq!(report.start_url, format!("{}/", base));
    assert_eq!(report.pages_crawled, 3);
    assert!(report.failures.is_empty());
    assert_eq!(
        page_urls(&report),
        vec![
            format!("{}/", base),
            format!("{}/a.html", base),
            format!("{}/b.html", base),
        ]
    );

    // Links are recorded verbatim, off-site ones included
    let home = report
        .pages
        .iter()
        .find(|p| p.url == format!("{}/", base))
        .unwrap();
    assert_eq!(home.links, vec!["a.html", "b.html", "https://elsewhere.test/"]);
}

#[tokio::test]
async fn test_budget_stops_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a", "/b"]).await;

    for route in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/c">c</a>"#))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.crawler.max_pages = Some(2);

    let report = run_crawl(config).await.unwrap();

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.pages.len(), 2);
    assert!(report.contains_page(&format!("{}/", server.uri())));
    assert!(!report.contains_page(&format!("{}/c", server.uri())));
}

#[tokio::test]
async fn test_robots_forbidden_allows_all() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(403)).await;
    mount_page(&server, "/", &["private/page.html"]).await;
    mount_page(&server, "/private/page.html", &[]).await;

    let report = run_crawl(create_test_config(&format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 2);
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
    )
    .await;
    mount_page(&server, "/", &["private/secret.html", "public.html"]).await;
    mount_page(&server, "/public.html", &[]).await;
    Mock::given(method("GET"))
        .and(path("/private/secret.html"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_crawl(create_test_config(&format!("{}/", server.uri())))
        .await
        .unwrap();

    let secret = format!("{}/private/secret.html", server.uri());
    assert_eq!(report.pages_crawled, 2);
    assert!(!report.contains_page(&secret));
    assert!(report.failures.iter().all(|f| f.url != secret));
}

#[tokio::test]
async fn test_robots_rules_for_own_token() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("User-agent: TestBot\nDisallow: /a\n\nUser-agent: *\nDisallow: /"),
    )
    .await;
    mount_page(&server, "/", &["a", "b"]).await;
    mount_page(&server, "/b", &[]).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_crawl(create_test_config(&format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 2);
}

#[tokio::test]
async fn test_disallowed_seed_yields_empty_report() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_crawl(create_test_config(&format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 0);
    assert!(report.pages.is_empty());
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_server_errors_become_one_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["a", "b"]).await;
    mount_page(&server, "/a", &[]).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let report = run_crawl(create_test_config(&format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, format!("{}/b", server.uri()));
    assert!(report.failures[0].error.contains("500"));
    assert!(!report.contains_page(&format!("{}/b", server.uri())));
}

#[tokio::test]
async fn test_every_page_fetched_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["a", "b", "a", "/", "c"]).await;
    mount_page(&server, "/a", &["b", "c", "/"]).await;
    mount_page(&server, "/b", &["a", "c"]).await;
    mount_page(&server, "/c", &["a", "b", "c"]).await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.crawler.workers = 4;

    let report = run_crawl(config).await.unwrap();

    let urls = page_urls(&report);
    let mut deduped = urls.clone();
    deduped.dedup();
    assert_eq!(urls.len(), 4);
    assert_eq!(urls, deduped);
}

#[tokio::test]
async fn test_scope_is_seed_prefix() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", &["intro.html", "/blog/post.html", "/docs-old/"]).await;
    mount_page(&server, "/docs/intro.html", &["../index.html"]).await;
    for route in ["/blog/post.html", "/docs-old/", "/index.html"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    }

    let report = run_crawl(create_test_config(&format!("{}/docs/", server.uri())))
        .await
        .unwrap();

    assert_eq!(
        page_urls(&report),
        vec![
            format!("{}/docs/", server.uri()),
            format!("{}/docs/intro.html", server.uri()),
        ]
    );
}

/// Serves a small site and records when each page request arrived
///
/// `/` links to `a`, `b` and `c`; `/a` always answers 500 so it is retried.
#[derive(Clone, Default)]
struct TimedSite {
    arrivals: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl TimedSite {
    fn arrivals(&self) -> Vec<(String, Instant)> {
        self.arrivals.lock().unwrap().clone()
    }
}

impl Respond for TimedSite {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let route = request.url.path().to_string();
        if route == "/robots.txt" {
            return ResponseTemplate::new(404);
        }
        self.arrivals
            .lock()
            .unwrap()
            .push((route.clone(), Instant::now()));

        match route.as_str() {
            "/" => ResponseTemplate::new(200).set_body_raw(
                r#"<a href="a">a</a><a href="b">b</a><a href="c">c</a>"#,
                "text/html",
            ),
            "/a" => ResponseTemplate::new(500),
            _ => ResponseTemplate::new(200).set_body_raw("<p>leaf</p>", "text/html"),
        }
    }
}

#[tokio::test]
async fn test_every_request_including_retries_is_spaced() {
    let server = MockServer::start().await;
    let site = TimedSite::default();
    Mock::given(method("GET"))
        .respond_with(site.clone())
        .mount(&server)
        .await;

    let interval = Duration::from_millis(100);
    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.crawler.politeness_delay_ms = interval.as_millis() as u64;
    config.crawler.max_attempts = 3;

    let report = run_crawl(config).await.unwrap();
    assert_eq!(report.pages_crawled, 3);
    assert_eq!(report.failures.len(), 1);

    let arrivals = site.arrivals();
    assert_eq!(arrivals.len(), 6, "requests: {:?}", arrivals);
    assert_eq!(arrivals.iter().filter(|(route, _)| route == "/a").count(), 3);

    // Arrival is measured on the server, so allow for a little scheduling jitter
    let floor = interval - Duration::from_millis(20);
    for pair in arrivals.windows(2) {
        let gap = pair[1].1.duration_since(pair[0].1);
        assert!(
            gap >= floor,
            "{} followed {} after only {:?}",
            pair[1].0,
            pair[0].0,
            gap
        );
    }
}

#[tokio::test]
async fn test_all_failures_still_produce_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_crawl(create_test_config(&format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("404"));
}

#[tokio::test]
async fn test_report_written_with_config_hash() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["a"]).await;
    mount_page(&server, "/a", &[]).await;

    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("crawl_output.json");
    let summary_path = dir.path().join("summary.md");

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.output.report_path = report_path.display().to_string();
    config.output.summary_path = Some(summary_path.display().to_string());
    let sinks = file_sinks(&config.output);

    let report = Coordinator::new(config)
        .unwrap()
        .with_config_hash("deadbeef")
        .run()
        .await
        .unwrap();
    emit_report(&report, &sinks).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["pages_crawled"], 2);
    assert_eq!(written["config_hash"], "deadbeef");
    assert_eq!(written["pages"].as_array().unwrap().len(), 2);

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("- **Pages Crawled**: 2"));
}
