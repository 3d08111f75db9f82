//! Segmented index state
//!
//! The state is a list of immutable segments, each holding a run of
//! consecutive documents and their postings. Appending adds a one-document
//! segment and merges equal-sized neighbours, so segment sizes stay powers
//! of two and a snapshot clone copies only a handful of `Arc`s.

use crate::index::document::{DocId, Document};
use crate::storage::StorageError;
use std::collections::HashMap;
use std::sync::Arc;

/// Occurrences of one term in one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
    pub positions: Vec<u32>,
}

/// Consecutive documents `first_id..first_id + len` and their postings
#[derive(Debug, Default)]
struct Segment {
    first_id: DocId,
    documents: Vec<Arc<Document>>,
    postings: HashMap<String, Vec<Posting>>,
}

impl Segment {
    fn new(first_id: DocId) -> Self {
        Self {
            first_id,
            ..Self::default()
        }
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    fn add(&mut self, document: Arc<Document>) {
        for (term, offsets) in &document.term_positions {
            self.postings.entry(term.clone()).or_default().push(Posting {
                doc_id: document.id,
                term_frequency: offsets.len() as u32,
                positions: offsets.iter().map(|o| o.position).collect(),
            });
        }
        self.documents.push(document);
    }

    /// `older` followed by `newer`, as one segment
    fn merge(older: &Segment, newer: &Segment) -> Segment {
        let mut merged = Segment {
            first_id: older.first_id,
            documents: Vec::with_capacity(older.len() + newer.len()),
            postings: older.postings.clone(),
        };
        merged.documents.extend(older.documents.iter().cloned());
        merged.documents.extend(newer.documents.iter().cloned());
        for (term, postings) in &newer.postings {
            merged
                .postings
                .entry(term.clone())
                .or_default()
                .extend(postings.iter().cloned());
        }
        merged
    }

    fn document(&self, id: DocId) -> Option<&Document> {
        let index = id.checked_sub(self.first_id)? as usize;
        self.documents.get(index).map(|d| d.as_ref())
    }
}

/// Postings of one term across segments, sorted by doc id
#[derive(Debug, Clone, Default)]
pub(crate) struct PostingList<'a> {
    parts: Vec<&'a [Posting]>,
}

impl<'a> PostingList<'a> {
    /// Number of documents containing the term
    pub fn len(&self) -> usize {
        self.parts.iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Posting> + '_ {
        self.parts.iter().copied().flat_map(|p| p.iter())
    }

    /// The posting for `doc_id`, if the term occurs in that document
    pub fn find(&self, doc_id: DocId) -> Option<&'a Posting> {
        let part: &'a [Posting] = self
            .parts
            .iter()
            .copied()
            .find(|p| p.last().map_or(false, |last| last.doc_id >= doc_id))?;
        part.binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| &part[i])
    }
}

/// One consistent view of the index: documents plus their postings
///
/// Cloning is cheap; segments are shared and never modified once built.
#[derive(Debug, Clone, Default)]
pub(crate) struct IndexState {
    segments: Vec<Arc<Segment>>,
    doc_count: usize,
}

impl IndexState {
    pub fn from_documents(documents: Vec<Document>) -> Result<Self, StorageError> {
        let mut state = Self::default();
        state.append(documents)?;
        Ok(state)
    }

    /// Appends a whole document and its postings
    pub fn push(&mut self, document: Document) -> Result<(), StorageError> {
        self.append(vec![document])
    }

    /// Appends documents with consecutive ids following the last one
    pub fn append(&mut self, documents: Vec<Document>) -> Result<(), StorageError> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut segment = Segment::new(self.next_id());
        for document in documents {
            let expected = self.next_id() as usize + segment.len();
            if document.id as usize != expected {
                return Err(StorageError::Corrupt(format!(
                    "document id {} does not follow {}",
                    document.id, expected
                )));
            }
            segment.add(Arc::new(document));
        }

        self.doc_count += segment.len();
        self.segments.push(Arc::new(segment));
        self.compact();
        Ok(())
    }

    /// Merges the newest segments while they are at least as large as
    /// their predecessor
    fn compact(&mut self) {
        while self.segments.len() >= 2 {
            let n = self.segments.len();
            if self.segments[n - 1].len() < self.segments[n - 2].len() {
                break;
            }
            let merged = Segment::merge(&self.segments[n - 2], &self.segments[n - 1]);
            self.segments.truncate(n - 2);
            self.segments.push(Arc::new(merged));
        }
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    pub fn next_id(&self) -> DocId {
        self.doc_count as DocId
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        let after = self.segments.partition_point(|s| s.first_id <= id);
        self.segments.get(after.checked_sub(1)?)?.document(id)
    }

    pub fn postings(&self, term: &str) -> PostingList<'_> {
        PostingList {
            parts: self
                .segments
                .iter()
                .filter_map(|s| s.postings.get(term))
                .map(Vec::as_slice)
                .collect(),
        }
    }

    /// Every distinct term with its postings across segments
    pub fn terms(&self) -> impl Iterator<Item = (&str, PostingList<'_>)> {
        let mut lists: HashMap<&str, PostingList<'_>> = HashMap::new();
        for segment in &self.segments {
            for (term, postings) in &segment.postings {
                lists
                    .entry(term.as_str())
                    .or_default()
                    .parts
                    .push(postings.as_slice());
            }
        }
        lists.into_iter()
    }
}
