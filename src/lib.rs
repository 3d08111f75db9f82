//! Sumi-Search: crawl, index and search web content
//!
//! This crate crawls pages from a seed URL with a bounded pool of workers,
//! feeds their plain text into an inverted index, and answers ranked
//! queries with highlighted fragments.

pub mod config;
pub mod crawler;
pub mod index;
pub mod orchestrator;
pub mod output;
pub mod search;
pub mod storage;
pub mod url;

use thiserror::Error;

pub use crawler::FetchError;
pub use search::QuerySyntaxError;
pub use storage::StorageError;

/// Main error type for Sumi-Search operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Query syntax error: {0}")]
    QuerySyntax(#[from] QuerySyntaxError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error categories surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The seed or a page could not be fetched
    Fetch,
    /// The query string could not be parsed
    QuerySyntax,
    /// The index backing store could not be opened, read or written
    Storage,
    /// The configuration is missing or invalid
    Configuration,
}

impl ErrorCategory {
    /// Message shown to the user for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Fetch => "The requested page could not be retrieved.",
            Self::QuerySyntax => "The search query could not be understood.",
            Self::Storage => "The index directory could not be opened.",
            Self::Configuration => "The application is not configured correctly.",
        }
    }
}

impl SumiError {
    /// Returns the user-facing category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) | Self::Url(_) | Self::Reqwest(_) => ErrorCategory::Fetch,
            Self::QuerySyntax(_) => ErrorCategory::QuerySyntax,
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Returns the localized message for this error's category
    pub fn user_message(&self) -> &'static str {
        self.category().user_message()
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Search operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use index::{DocId, Document, IndexReader, InvertedIndex};
pub use orchestrator::{IndexOrchestrator, IndexReport, SearchOrchestrator, SearchPage, SearchResult};
pub use search::{Highlighter, Query, QueryEngine};
pub use url::normalize_url;
