//! Crawler module for fetching pages into the index
//!
//! This module contains the core crawling logic, including:
//! - Page sources for HTTP and local files
//! - HTML parsing for text and link extraction
//! - Shared visited-set and worker bookkeeping
//! - Overall crawl coordination and cancellation

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{CancelHandle, CrawlOptions, CrawlSummary, Crawler};
pub use fetcher::{
    build_http_client, ContentKind, FetchError, FileFetcher, HttpFetcher, PageContent,
    PageFetcher, SourceFetcher,
};
pub use parser::{parse_html, ParsedPage};
pub use scheduler::{CrawlState, WorkerSlot};
