//! Page sources
//!
//! This module turns a URL into indexable content:
//! - HTTP(S) pages fetched with reqwest
//! - Local files and directories behind `file://` URLs
//! - Error classification into [`FetchError`], never a panic

use crate::config::{CrawlConfig, UserAgentConfig};
use crate::crawler::parser::parse_html;
use crate::url::normalize_parsed;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;
use url::Url;

/// Reasons a single page could not be fetched
///
/// These are recoverable: the crawl skips the page and carries on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Malformed or unsupported URL: {0}")]
    MalformedUrl(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Host unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Unsupported content type: {0}")]
    ContentMismatch(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What kind of resource a fetch produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    PlainText,
    /// A local directory; only its entries are of interest
    Directory,
}

/// Result of fetching one URL
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Final URL after redirects
    pub url: Url,
    pub kind: ContentKind,
    pub title: String,
    pub text: String,
    /// Absolute, normalized, deduplicated outbound links
    pub links: Vec<Url>,
}

impl PageContent {
    /// Whether this content should become a document
    pub fn is_indexable(&self) -> bool {
        self.kind != ContentKind::Directory
    }

    fn from_html(url: Url, body: &str) -> Self {
        let parsed = parse_html(body, &url);
        let title = parsed.title.unwrap_or_else(|| fallback_title(&url));
        Self {
            url,
            kind: ContentKind::Html,
            title,
            text: parsed.text,
            links: parsed.links,
        }
    }

    fn from_text(url: Url, body: String) -> Self {
        let title = fallback_title(&url);
        Self {
            url,
            kind: ContentKind::PlainText,
            title,
            text: body,
            links: Vec::new(),
        }
    }
}

/// A source of pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one URL. Failures come back as values, never panics.
    async fn fetch(&self, url: &Url) -> Result<PageContent, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Identification sent with every request
/// * `crawl` - Timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawl: &CrawlConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawl.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawl.connect_timeout_secs))
        .redirect(Policy::limited(5))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &UserAgentConfig, crawl: &CrawlConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(user_agent, crawl)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Scheme other than http/https | MalformedUrl |
    /// | Timeout | Timeout |
    /// | Connection refused, DNS, TLS | Unreachable |
    /// | Non-2xx status | HttpStatus |
    /// | Not HTML or plain text | ContentMismatch |
    /// | Body read failure | Transport |
    async fn fetch(&self, url: &Url) -> Result<PageContent, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::MalformedUrl(url.to_string()));
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().clone();
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type)
            .unwrap_or_default();

        let kind = match mime.as_str() {
            "" | "text/html" | "application/xhtml+xml" => ContentKind::Html,
            "text/plain" => ContentKind::PlainText,
            _ => return Err(FetchError::ContentMismatch(mime)),
        };

        let body = response.text().await.map_err(classify)?;
        trace!("Fetched {} ({} bytes)", final_url, body.len());

        Ok(match kind {
            ContentKind::PlainText => PageContent::from_text(final_url, body),
            _ => PageContent::from_html(final_url, &body),
        })
    }
}

/// Reads pages from the local filesystem
///
/// Files ending in `.html`/`.htm` are parsed as HTML, anything else is
/// taken as plain text. A directory yields its visible entries as links.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl PageFetcher for FileFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageContent, FetchError> {
        if url.scheme() != "file" {
            return Err(FetchError::MalformedUrl(url.to_string()));
        }
        let path = url
            .to_file_path()
            .map_err(|_| FetchError::MalformedUrl(url.to_string()))?;

        let metadata = tokio::fs::metadata(&path).await?;
        if metadata.is_dir() {
            return read_directory(url, &path).await;
        }

        let bytes = tokio::fs::read(&path).await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        if is_html_path(&path) {
            Ok(PageContent::from_html(url.clone(), &body))
        } else {
            Ok(PageContent::from_text(url.clone(), body))
        }
    }
}

async fn read_directory(url: &Url, path: &Path) -> Result<PageContent, FetchError> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut links = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if let Ok(link) = Url::from_file_path(entry.path()) {
            if let Ok(link) = normalize_parsed(link) {
                links.push(link);
            }
        }
    }
    links.sort();

    Ok(PageContent {
        url: url.clone(),
        kind: ContentKind::Directory,
        title: fallback_title(url),
        text: String::new(),
        links,
    })
}

/// Dispatches to the HTTP or file source by URL scheme
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl SourceFetcher {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            file: FileFetcher,
        }
    }
}

#[async_trait]
impl PageFetcher for SourceFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageContent, FetchError> {
        match url.scheme() {
            "http" | "https" => self.http.fetch(url).await,
            "file" => self.file.fetch(url).await,
            _ => Err(FetchError::MalformedUrl(url.to_string())),
        }
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Unreachable(err.to_string())
    } else if err.is_builder() {
        FetchError::MalformedUrl(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}

/// `text/HTML; charset=utf-8` -> `text/html`
fn media_type(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

/// Last path segment, or the whole URL when there is none
fn fallback_title(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| url.to_string())
}
