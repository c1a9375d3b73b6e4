//! HTML link extraction
//!
//! Extracts the raw `href` values of anchors in document order. Resolution
//! and scoping of the hrefs is left to the caller so page records keep the
//! links exactly as they appear in the page.

use scraper::{Html, Selector};

/// Returns the `href` attribute of every `<a href>` element, as written, in order
///
/// Malformed markup never fails: the HTML5 parser recovers and whatever
/// anchors it finds are returned.
///
/// # Example
///
/// ```
/// use webcrawler::crawler::extract_links;
///
/// let html = r#"<html><body><a href="/page">Link</a><a href="/page">Again</a></body></html>"#;
/// assert_eq!(extract_links(html), vec!["/page".to_string(), "/page".to_string()]);
/// ```
pub fn extract_links(html: &str) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    Html::parse_document(html)
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
