use url::Url;

/// Extracts the lowercase host of a URL
///
/// Returns `None` for URLs without a host, such as `file:///` paths.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_search::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Returns true when both URLs point at the same host (ports ignored)
pub fn same_host(a: &Url, b: &Url) -> bool {
    extract_domain(a) == extract_domain(b)
}
