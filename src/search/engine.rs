//! Query evaluation and tf-idf ranking

use crate::index::{DocId, IndexReader, Posting, PostingList};
use crate::search::query::{Query, QuerySyntaxError};
use std::cmp::Ordering;
use tracing::debug;

/// A matching document and its relevance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

/// Ranked matches for one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopDocs {
    /// Number of matching documents before truncation
    pub total_hits: usize,
    /// Best matches first, at most `max_results` of them
    pub hits: Vec<ScoredDoc>,
}

/// Evaluates queries against an index snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine;

impl QueryEngine {
    pub fn new() -> Self {
        Self
    }

    /// Parses a query string, see [`Query::parse`]
    pub fn parse(&self, input: &str) -> Result<Query, QuerySyntaxError> {
        Query::parse(input)
    }

    /// Finds every document matching all clauses of `query`
    ///
    /// Each distinct query term contributes `tf * ln(N / df)` to a
    /// document's score. Results are ordered by score, ties by lower doc
    /// id, and truncated to `max_results` only after every match is scored.
    pub fn search(&self, reader: &IndexReader, query: &Query, max_results: usize) -> TopDocs {
        let terms = query.terms();
        let lists: Vec<PostingList<'_>> = terms.iter().map(|t| reader.postings(t)).collect();

        if lists.iter().any(|l| l.is_empty()) {
            return TopDocs::default();
        }

        let total_docs = reader.doc_count() as f64;
        let idf: Vec<f64> = lists
            .iter()
            .map(|l| (total_docs / l.len() as f64).ln())
            .collect();

        // Drive the intersection from the rarest term
        let driver = lists
            .iter()
            .enumerate()
            .min_by_key(|(_, l)| l.len())
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut hits = Vec::new();
        'candidates: for candidate in lists[driver].iter() {
            let mut matched: Vec<&Posting> = Vec::with_capacity(lists.len());
            for list in &lists {
                match list.find(candidate.doc_id) {
                    Some(p) => matched.push(p),
                    None => continue 'candidates,
                }
            }

            for phrase in query.phrases() {
                let postings: Vec<&Posting> = phrase
                    .iter()
                    .filter_map(|word| terms.iter().position(|t| *t == word.as_str()))
                    .map(|i| matched[i])
                    .collect();
                if !phrase_matches(&postings) {
                    continue 'candidates;
                }
            }

            let score: f64 = matched
                .iter()
                .zip(&idf)
                .map(|(p, idf)| f64::from(p.term_frequency) * idf)
                .sum();

            hits.push(ScoredDoc {
                doc_id: candidate.doc_id,
                score: score as f32,
            });
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
        });

        let total_hits = hits.len();
        hits.truncate(max_results);

        debug!(
            "Query matched {} documents, returning {}",
            total_hits,
            hits.len()
        );
        TopDocs { total_hits, hits }
    }
}

/// True if the terms occur at consecutive positions somewhere
fn phrase_matches(postings: &[&Posting]) -> bool {
    let Some((first, rest)) = postings.split_first() else {
        return false;
    };

    first.positions.iter().any(|&start| {
        rest.iter().enumerate().all(|(k, p)| {
            p.positions
                .binary_search(&(start + k as u32 + 1))
                .is_ok()
        })
    })
}
