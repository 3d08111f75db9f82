use crate::config::{Config, PathResolver, SearchConfig};
use crate::index::IndexReader;
use crate::orchestrator::format_elapsed;
use crate::search::{HighlightConfig, Highlighter, QueryEngine};
use crate::SumiError;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One ranked hit, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    /// Highlighted excerpt, empty when the document has no text
    pub fragment: String,
    pub path: String,
    pub score: f32,
}

/// One page of results for a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub query: String,
    /// Zero-based page number
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<SearchResult>,
    /// Matching documents across all pages
    pub total_hits: usize,
    #[serde(serialize_with = "serialize_elapsed")]
    pub elapsed: Duration,
}

impl SearchPage {
    /// Elapsed time in seconds with two decimals
    pub fn elapsed_seconds(&self) -> String {
        format_elapsed(self.elapsed)
    }

    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        (self.total_hits + self.page_size - 1) / self.page_size
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }
}

fn serialize_elapsed<S: serde::Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(elapsed.as_secs_f64())
}

enum ReaderSlot {
    /// Opened from this directory on first use
    Directory(PathBuf, Option<IndexReader>),
    Reader(IndexReader),
}

/// Answers queries one page at a time
///
/// The reader is refreshed before every query, so documents indexed since
/// the previous query become visible.
pub struct SearchOrchestrator {
    reader: Mutex<ReaderSlot>,
    engine: QueryEngine,
    highlighter: Highlighter,
    search: SearchConfig,
    sent_queries: Mutex<Vec<String>>,
}

impl SearchOrchestrator {
    /// Searches the index stored in the configured directory
    pub fn new(config: &Config, resolver: &dyn PathResolver) -> Self {
        let dir = resolver.index_directory(&config.index);
        Self::build(ReaderSlot::Directory(dir, None), &config.search)
    }

    /// Searches through an existing reader, such as a live writer snapshot
    pub fn with_reader(reader: IndexReader, search: &SearchConfig) -> Self {
        Self::build(ReaderSlot::Reader(reader), search)
    }

    fn build(slot: ReaderSlot, search: &SearchConfig) -> Self {
        Self {
            reader: Mutex::new(slot),
            engine: QueryEngine::new(),
            highlighter: Highlighter::new(HighlightConfig::from(search)),
            search: search.clone(),
            sent_queries: Mutex::new(Vec::new()),
        }
    }

    /// Runs `query` and returns page `page` with the configured page size
    ///
    /// Opening or refreshing a stored reader reads the index from disk, so
    /// async callers should run this on a blocking thread.
    pub fn search(&self, query: &str, page: usize) -> Result<SearchPage, SumiError> {
        self.search_page(query, page, self.search.page_size)
    }

    /// Runs `query` and returns hits `[page * page_size, page * page_size + page_size)`
    ///
    /// The query is parsed before the index is touched, so a syntax error
    /// never opens or refreshes a reader.
    pub fn search_page(
        &self,
        query: &str,
        page: usize,
        page_size: usize,
    ) -> Result<SearchPage, SumiError> {
        let started = Instant::now();
        let parsed = self.engine.parse(query)?;
        self.remember(query);

        let reader = self.current_reader()?;
        let top = self.engine.search(&reader, &parsed, self.search.max_results);

        let results: Vec<SearchResult> = top
            .hits
            .iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .filter_map(|hit| {
                let document = reader.document(hit.doc_id)?;
                Some(SearchResult {
                    title: document.title.clone(),
                    fragment: self.highlighter.fragment(&reader, hit.doc_id, &parsed),
                    path: document.path.clone(),
                    score: hit.score,
                })
            })
            .collect();

        let result = SearchPage {
            query: query.to_string(),
            page,
            page_size,
            results,
            total_hits: top.total_hits,
            elapsed: started.elapsed(),
        };
        info!(
            "Query '{}' matched {} documents in {} seconds",
            query,
            result.total_hits,
            result.elapsed_seconds()
        );
        Ok(result)
    }

    /// Distinct queries sent so far, in order of first use
    pub fn sent_queries(&self) -> Vec<String> {
        self.sent_queries.lock().clone()
    }

    fn remember(&self, query: &str) {
        let query = query.trim();
        let mut sent = self.sent_queries.lock();
        if !sent.iter().any(|q| q == query) {
            sent.push(query.to_string());
        }
    }

    /// Opens the reader on first use and refreshes it afterwards
    fn current_reader(&self) -> Result<IndexReader, SumiError> {
        let mut slot = self.reader.lock();
        let reader = match &mut *slot {
            ReaderSlot::Reader(reader) => reader,
            ReaderSlot::Directory(dir, cached) => {
                let opened = match cached.take() {
                    Some(reader) => reader,
                    None => {
                        debug!("Opening index reader at {}", dir.display());
                        IndexReader::open(dir.as_path())?
                    }
                };
                cached.insert(opened)
            }
        };
        reader.refresh_if_changed()?;
        Ok(reader.clone())
    }
}
