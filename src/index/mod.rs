//! Inverted index module
//!
//! Documents are tokenized into lowercase terms with their word positions
//! and byte offsets. One writer handle appends documents; readers work on
//! immutable snapshots that are refreshed explicitly.

mod document;
mod postings;
mod reader;
mod tokenizer;
mod writer;

pub use document::{DocId, Document, TermOffset};
pub(crate) use postings::{Posting, PostingList};
pub use reader::IndexReader;
pub use tokenizer::{terms, tokenize, Token};
pub use writer::InvertedIndex;
