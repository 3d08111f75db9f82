use crate::config::{Config, CrawlConfig, PathResolver};
use crate::crawler::{CrawlOptions, CrawlSummary, Crawler, HttpFetcher, PageFetcher, SourceFetcher};
use crate::index::InvertedIndex;
use crate::orchestrator::format_elapsed;
use crate::{SumiError, UrlError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

/// Outcome of one indexing run
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub seed: Url,
    /// Documents added during this run
    pub documents: usize,
    pub elapsed: Duration,
    pub summary: CrawlSummary,
}

impl IndexReport {
    /// Elapsed time in seconds with two decimals
    pub fn elapsed_seconds(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// Drives a full crawl into the configured index directory
pub struct IndexOrchestrator {
    index_dir: PathBuf,
    crawl: CrawlConfig,
    fetcher: Arc<dyn PageFetcher>,
}

impl IndexOrchestrator {
    /// Creates an orchestrator that fetches over HTTP(S) and from local files
    pub fn new(config: &Config, resolver: &dyn PathResolver) -> Result<Self, SumiError> {
        let http = HttpFetcher::new(&config.user_agent, &config.crawl)?;
        Ok(Self::with_fetcher(
            config,
            resolver,
            Arc::new(SourceFetcher::new(http)),
        ))
    }

    /// Creates an orchestrator over any page source
    pub fn with_fetcher(
        config: &Config,
        resolver: &dyn PathResolver,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            index_dir: resolver.index_directory(&config.index),
            crawl: config.crawl.clone(),
            fetcher,
        }
    }

    pub fn index_directory(&self) -> &Path {
        &self.index_dir
    }

    /// Indexes from `seed` with the configured depth and worker bounds
    pub async fn index(&self, seed: &str) -> Result<IndexReport, SumiError> {
        self.index_with(seed, self.crawl.max_depth, self.crawl.max_workers as usize)
            .await
    }

    /// Opens the index writer, crawls, and closes the writer
    ///
    /// The writer is closed even if the crawl fails. If a time limit is
    /// configured, the crawl is cancelled when it runs out.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed URL, or a local path
    /// * `max_depth` - Maximum hops from the seed
    /// * `max_workers` - Maximum concurrent fetches
    ///
    /// # Returns
    ///
    /// * `Ok(IndexReport)` - Documents indexed and elapsed time
    /// * `Err(SumiError)` - Invalid seed, or the index could not be opened or written
    pub async fn index_with(
        &self,
        seed: &str,
        max_depth: u32,
        max_workers: usize,
    ) -> Result<IndexReport, SumiError> {
        let started = Instant::now();
        let seed = parse_seed(seed)?;

        let index = InvertedIndex::open(&self.index_dir)?;
        let crawler = Crawler::new(
            index.clone(),
            Arc::clone(&self.fetcher),
            CrawlOptions::from(&self.crawl),
        );

        let timer = self.crawl.time_limit_secs.map(|secs| {
            let handle = crawler.cancel_handle();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                warn!("Time limit of {}s reached, cancelling crawl", secs);
                handle.cancel();
            })
        });

        let crawled = crawler.crawl(&seed, max_depth, max_workers).await;
        if let Some(timer) = timer {
            timer.abort();
        }

        let closed = index.close();
        let summary = crawled?;
        closed?;

        let report = IndexReport {
            seed,
            documents: summary.documents_indexed,
            elapsed: started.elapsed(),
            summary,
        };
        info!(
            "Indexed {} documents from {} in {} seconds",
            report.documents,
            report.seed,
            report.elapsed_seconds()
        );
        Ok(report)
    }
}

/// Accepts a URL, or a path to an existing local file or directory
pub fn parse_seed(seed: &str) -> Result<Url, UrlError> {
    let seed = seed.trim();
    // A one-letter scheme is a Windows drive, not a URL
    if let Ok(url) = Url::parse(seed) {
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = Path::new(seed);
    if path.exists() {
        let absolute = path
            .canonicalize()
            .map_err(|e| UrlError::Parse(format!("{}: {}", seed, e)))?;
        let url = if absolute.is_dir() {
            Url::from_directory_path(&absolute)
        } else {
            Url::from_file_path(&absolute)
        };
        return url.map_err(|_| UrlError::Parse(seed.to_string()));
    }

    Err(UrlError::Parse(format!("not a URL or existing path: {}", seed)))
}
