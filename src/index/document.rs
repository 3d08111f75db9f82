use crate::index::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document identifier, assigned by the index in insertion order
pub type DocId = u32;

/// Where one occurrence of a term sits in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermOffset {
    /// Zero-based word position
    pub position: u32,
    /// Byte range of the occurrence in `contents`
    pub start: usize,
    pub end: usize,
}

/// An indexed document. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    /// Source URL or file path
    pub path: String,
    pub contents: String,
    /// Occurrences of each term, in position order
    pub term_positions: BTreeMap<String, Vec<TermOffset>>,
}

impl Document {
    /// Tokenizes `contents` and records every term occurrence
    pub fn build(id: DocId, title: String, path: String, contents: String) -> Self {
        let mut term_positions: BTreeMap<String, Vec<TermOffset>> = BTreeMap::new();

        for token in tokenize(&contents) {
            term_positions.entry(token.term).or_default().push(TermOffset {
                position: token.position,
                start: token.start,
                end: token.end,
            });
        }

        Self {
            id,
            title,
            path,
            contents,
            term_positions,
        }
    }

    /// Number of occurrences of `term`
    pub fn term_frequency(&self, term: &str) -> u32 {
        self.term_positions
            .get(term)
            .map(|offsets| offsets.len() as u32)
            .unwrap_or(0)
    }

    /// Whether any term occurrence was recorded
    pub fn has_term_data(&self) -> bool {
        !self.term_positions.is_empty()
    }
}
