use url::Url;

/// Returns the directory-level URL of `page`
///
/// Everything after the last `/` of the path is dropped, along with the query
/// and fragment: `https://x.test/a/b.html?p=1` becomes `https://x.test/a/`.
pub fn directory_url(page: &Url) -> Url {
    let mut dir = page.clone();
    dir.set_query(None);
    dir.set_fragment(None);

    let path = page.path();
    let cut = path.rfind('/').map(|i| i + 1).unwrap_or(path.len());
    let dir_path = path[..cut].to_string();
    dir.set_path(&dir_path);
    dir
}

/// Resolves an href found on `page_url` to an absolute URL
///
/// * hrefs that already start with `<scheme>:` are returned unchanged
/// * `javascript:`, `mailto:`, `tel:` and `data:` hrefs are skipped
/// * anything else is joined to the page's directory-level URL, and the
///   fragment of the result is dropped
///
/// Returns `None` when the href cannot be resolved.
pub fn resolve_href(page_url: &str, href: &str, scheme: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if let Some(head) = href.get(..scheme.len()) {
        if head.eq_ignore_ascii_case(scheme) && href[scheme.len()..].starts_with(':') {
            return Some(href.to_string());
        }
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|special| lower.starts_with(special))
    {
        return None;
    }

    let page = Url::parse(page_url).ok()?;
    let mut absolute = directory_url(&page).join(href).ok()?;
    absolute.set_fragment(None);
    Some(absolute.to_string())
}
