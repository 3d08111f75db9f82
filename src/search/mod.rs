//! Search module
//!
//! Parses query strings, ranks matching documents against an index
//! snapshot, and extracts highlighted fragments for the hits.

mod engine;
mod highlight;
mod query;

pub use engine::{QueryEngine, ScoredDoc, TopDocs};
pub use highlight::{HighlightConfig, Highlighter};
pub use query::{Clause, Query, QuerySyntaxError};
