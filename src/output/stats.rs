//! Statistics over an index snapshot
//!
//! This module provides functionality for extracting and displaying
//! index statistics from a reader.

use crate::index::{DocId, IndexReader};
use crate::url::extract_domain;
use std::collections::HashSet;
use url::Url;

/// Index statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatistics {
    /// Total number of documents
    pub total_documents: u64,

    /// Documents without any indexed term
    pub empty_documents: u64,

    /// Number of distinct terms
    pub unique_terms: u64,

    /// Number of (term, document) postings
    pub total_postings: u64,

    /// Sum of all term occurrences
    pub total_occurrences: u64,

    /// Distinct web hosts among document paths
    pub unique_hosts: u64,

    /// Most frequent terms by occurrences, ties by term
    pub top_terms: Vec<(String, u64)>,
}

/// Loads statistics from a reader
///
/// # Arguments
///
/// * `reader` - The index snapshot to inspect
/// * `top_n` - How many of the most frequent terms to report
pub fn load_statistics(reader: &IndexReader, top_n: usize) -> IndexStatistics {
    let mut unique_terms = 0;
    let mut total_postings = 0;
    let mut total_occurrences = 0;
    let mut terms: Vec<(String, u64)> = Vec::new();

    for (term, doc_freq, occurrences) in reader.term_stats() {
        unique_terms += 1;
        total_postings += doc_freq as u64;
        total_occurrences += occurrences;
        terms.push((term.to_string(), occurrences));
    }

    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(top_n);

    let mut hosts = HashSet::new();
    let mut empty_documents = 0;
    for id in 0..reader.doc_count() as DocId {
        let Some(document) = reader.document(id) else {
            continue;
        };
        if !document.has_term_data() {
            empty_documents += 1;
        }
        if let Some(host) = Url::parse(&document.path).ok().and_then(|u| extract_domain(&u)) {
            hosts.insert(host);
        }
    }

    IndexStatistics {
        total_documents: reader.doc_count() as u64,
        empty_documents,
        unique_terms,
        total_postings,
        total_occurrences,
        unique_hosts: hosts.len() as u64,
        top_terms: terms,
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Documents: {}", stats.total_documents);
    println!("  Documents without text: {}", stats.empty_documents);
    println!("  Unique hosts: {}", stats.unique_hosts);
    println!("  Unique terms: {}", stats.unique_terms);
    println!("  Postings: {}", stats.total_postings);
    println!("  Term occurrences: {}", stats.total_occurrences);
    println!();

    if !stats.top_terms.is_empty() {
        println!("Most Frequent Terms:");
        for (term, count) in &stats.top_terms {
            let percentage = if stats.total_occurrences > 0 {
                (*count as f64 / stats.total_occurrences as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", term, count, percentage);
        }
    }
}
