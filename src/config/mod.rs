//! Configuration module for Sumi-Search
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving the index directory for the host operating system.
//!
//! # Example
//!
//! ```no_run
//! use sumi_search::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawl.max_depth);
//! ```

mod parser;
mod paths;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, IndexConfig, SearchConfig, UserAgentConfig};

// Re-export parser and path resolution
pub use parser::{load_config, parse_config};
pub use paths::{OsFamily, OsPathResolver, PathResolver};
