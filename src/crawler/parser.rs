//! HTML parser for extracting text, links and the title
//!
//! This module handles parsing HTML content to extract:
//! - Visible body text for indexing
//! - Links to follow (from <a> tags and canonical links)
//! - Page title

use crate::url::normalize_parsed;
use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Visible text with whitespace collapsed
    pub text: String,

    /// Normalized, deduplicated absolute links in document order
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts text, links and title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only anchors
/// - Schemes other than http/https, and file links from non-file pages
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```
/// use sumi_search::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><p>Hi</p><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.text, "Hi Link");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        text: extract_text(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Collects visible text nodes, skipping scripts, styles and the head
fn extract_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            parts.push(&**text);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut push = |href: &str| {
        if let Some(url) = resolve_link(href, base_url) {
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Unsupported schemes after resolution
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    let allowed = match absolute_url.scheme() {
        "http" | "https" => true,
        // Only local pages may point at local files
        "file" => base_url.scheme() == "file",
        _ => false,
    };
    if !allowed {
        return None;
    }

    normalize_parsed(absolute_url).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn link_strings(parsed: &ParsedPage) -> Vec<&str> {
        parsed.links.iter().map(|u| u.as_str()).collect()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test   Page  </title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_text_skips_scripts_and_styles() {
        let html = r#"
            <html>
            <head><title>T</title><style>body { color: red }</style></head>
            <body>
                <h1>Hello</h1>
                <script>var hidden = 1;</script>
                <p>visible
                   words</p>
                <noscript>enable js</noscript>
            </body>
            </html>
        "#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.text, "Hello visible words");
    }

    #[test]
    fn test_extract_relative_link() {
        let html = r#"<html><body><a href="/other">Link</a><a href="sibling/">Two</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            link_strings(&parsed),
            vec!["https://example.com/other", "https://example.com/sibling"]
        );
    }

    #[test]
    fn test_links_are_deduplicated() {
        let html = r#"
            <html><body>
                <a href="/a">One</a>
                <a href="/a#top">Same page</a>
                <a href="/a?utm_source=x">Tracked</a>
                <a href="/a?page=2">Variant</a>
            </body></html>
        "#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            link_strings(&parsed),
            vec!["https://example.com/a", "https://example.com/a?page=2"]
        );
    }

    #[test]
    fn test_skip_special_links() {
        let html = r##"
            <html><body>
                <a href="javascript:void(0)">js</a>
                <a href="mailto:test@example.com">mail</a>
                <a href="tel:+1234567890">call</a>
                <a href="data:text/html,<h1>x</h1>">data</a>
                <a href="#section">jump</a>
                <a href="/file.pdf" download>download</a>
                <a href="ftp://example.com/x">ftp</a>
                <a href="file:///etc/passwd">local</a>
            </body></html>
        "##;
        let parsed = parse_html(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_file_pages_link_to_files() {
        let base = Url::parse("file:///srv/docs/index.html").unwrap();
        let html = r#"<html><body><a href="guide.html">Guide</a></body></html>"#;
        let parsed = parse_html(html, &base);
        assert_eq!(link_strings(&parsed), vec!["file:///srv/docs/guide.html"]);
    }

    #[test]
    fn test_extract_canonical_link() {
        let html = r#"<html><head><link rel="canonical" href="https://example.com/canonical" /></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(link_strings(&parsed), vec!["https://example.com/canonical"]);
    }
}
