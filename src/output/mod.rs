//! Output module for presenting results
//!
//! This module handles:
//! - Rendering search pages and index reports for the terminal
//! - Computing and printing index statistics

mod results;
pub mod stats;

pub use results::{format_index_report, format_search_page};
pub use stats::{load_statistics, print_statistics, IndexStatistics};
