//! URL handling module for Sumi-Search
//!
//! Link normalization (the crawl's dedup key) and host extraction.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_host};
pub use normalize::{normalize_parsed, normalize_url};
