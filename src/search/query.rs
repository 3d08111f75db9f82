use crate::index::terms;
use thiserror::Error;

/// Errors produced while parsing a query string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuerySyntaxError {
    #[error("Query contains no searchable terms")]
    Empty,

    #[error("Unterminated phrase starting at byte {position}")]
    UnterminatedPhrase { position: usize },

    #[error("Phrase at byte {position} contains no searchable terms")]
    EmptyPhrase { position: usize },
}

/// One required part of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// A single term that must occur somewhere in the document
    Term(String),
    /// Terms that must occur at consecutive positions
    Phrase(Vec<String>),
}

/// A parsed query. Every clause must match for a document to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    /// Parses a query string
    ///
    /// Whitespace-separated words are AND-ed; text between double quotes is
    /// an exact phrase. Words are lowercased and punctuation dropped the
    /// same way document contents are tokenized.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_search::search::{Clause, Query};
    ///
    /// let query = Query::parse("fox \"quick brown\"").unwrap();
    /// assert_eq!(query.clauses()[0], Clause::Term("fox".to_string()));
    /// assert!(Query::parse("\"open").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, QuerySyntaxError> {
        let mut clauses = Vec::new();
        let mut rest = input;
        let mut offset = 0;

        while let Some(open) = rest.find('"') {
            push_terms(&mut clauses, &rest[..open]);

            let after_open = &rest[open + 1..];
            let close = after_open
                .find('"')
                .ok_or(QuerySyntaxError::UnterminatedPhrase {
                    position: offset + open,
                })?;

            let mut words = terms(&after_open[..close]);
            match words.len() {
                0 => {
                    return Err(QuerySyntaxError::EmptyPhrase {
                        position: offset + open,
                    })
                }
                1 => clauses.extend(words.pop().map(Clause::Term)),
                _ => clauses.push(Clause::Phrase(words)),
            }

            let consumed = open + 1 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        push_terms(&mut clauses, rest);

        if clauses.is_empty() {
            return Err(QuerySyntaxError::Empty);
        }
        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Distinct terms of all clauses, in order of first appearance
    pub fn terms(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for clause in &self.clauses {
            let words: &[String] = match clause {
                Clause::Term(term) => std::slice::from_ref(term),
                Clause::Phrase(words) => words,
            };
            for word in words {
                if !seen.contains(&word.as_str()) {
                    seen.push(word.as_str());
                }
            }
        }
        seen
    }

    /// Phrase clauses only
    pub fn phrases(&self) -> impl Iterator<Item = &[String]> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::Phrase(words) => Some(words.as_slice()),
            Clause::Term(_) => None,
        })
    }
}

fn push_terms(clauses: &mut Vec<Clause>, text: &str) {
    clauses.extend(terms(text).into_iter().map(Clause::Term));
}
