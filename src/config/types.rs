use serde::Deserialize;

/// Main configuration structure for Sumi-Search
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Index backing store location
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Default index directory, used when no OS-specific override applies
    pub directory: String,

    /// Index directory on Windows hosts
    #[serde(rename = "directory-windows", default)]
    pub directory_windows: Option<String>,

    /// Index directory on Unix-like hosts
    #[serde(rename = "directory-unix", default)]
    pub directory_unix: Option<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of hops from the seed URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of concurrent fetch-and-index workers
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: u32,

    /// Whole-request timeout for a single fetch (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout for a single fetch (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long a cancelled crawl waits for in-flight workers (seconds)
    #[serde(rename = "grace-period-secs", default = "default_grace_period")]
    pub grace_period_secs: u64,

    /// Optional overall time limit after which the crawl is cancelled (seconds)
    #[serde(rename = "time-limit-secs", default)]
    pub time_limit_secs: Option<u64>,

    /// Only follow links that stay on the seed's host
    #[serde(rename = "same-host-only", default)]
    pub same_host_only: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_workers: default_max_workers(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            grace_period_secs: default_grace_period(),
            time_limit_secs: None,
            same_host_only: false,
        }
    }
}

/// Query, pagination and highlighting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Ceiling on ranked hits collected per query
    #[serde(rename = "max-results", default = "default_max_results")]
    pub max_results: usize,

    /// Results shown per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: usize,

    /// Fragment window length in characters
    #[serde(rename = "fragment-size", default = "default_fragment_size")]
    pub fragment_size: usize,

    /// Maximum number of fragments per hit
    #[serde(rename = "max-fragments", default = "default_max_fragments")]
    pub max_fragments: usize,

    /// Text placed between fragments
    #[serde(rename = "fragment-separator", default = "default_fragment_separator")]
    pub fragment_separator: String,

    /// Markup opening a highlighted term
    #[serde(rename = "pre-tag", default = "default_pre_tag")]
    pub pre_tag: String,

    /// Markup closing a highlighted term
    #[serde(rename = "post-tag", default = "default_post_tag")]
    pub post_tag: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            page_size: default_page_size(),
            fragment_size: default_fragment_size(),
            max_fragments: default_max_fragments(),
            fragment_separator: default_fragment_separator(),
            pre_tag: default_pre_tag(),
            post_tag: default_post_tag(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_workers() -> u32 {
    8
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_grace_period() -> u64 {
    10
}

fn default_max_results() -> usize {
    1000
}

fn default_page_size() -> usize {
    10
}

fn default_fragment_size() -> usize {
    100
}

fn default_max_fragments() -> usize {
    3
}

fn default_fragment_separator() -> String {
    " ... ".to_string()
}

fn default_pre_tag() -> String {
    "<span class=\"term\">".to_string()
}

fn default_post_tag() -> String {
    "</span>".to_string()
}
