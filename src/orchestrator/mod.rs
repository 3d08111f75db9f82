//! Entry points for the presentation layer
//!
//! [`IndexOrchestrator`] runs one crawl-and-index cycle and
//! [`SearchOrchestrator`] runs one query-and-highlight cycle. Both time
//! themselves and return plain data ready for rendering; failures come back
//! as [`crate::SumiError`], whose category carries the user-facing message.

mod indexing;
mod searching;

pub use indexing::{parse_seed, IndexOrchestrator, IndexReport};
pub use searching::{SearchOrchestrator, SearchPage, SearchResult};

use std::time::Duration;

/// Seconds with two decimals, e.g. `0.42`
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64())
}
