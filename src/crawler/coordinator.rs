//! Crawler coordinator - main crawl loop
//!
//! This module drives one depth-bounded crawl:
//! - A FIFO frontier of (URL, depth) work units
//! - At most `max_workers` fetch-and-index tasks in flight
//! - Atomic claim of each discovered link in the shared visited set
//! - Coarse cancellation with a bounded drain of in-flight work

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{FetchError, PageContent, PageFetcher};
use crate::crawler::scheduler::{CrawlState, WorkerSlot};
use crate::index::{DocId, InvertedIndex};
use crate::storage::StorageError;
use crate::url::{normalize_parsed, same_host};
use crate::SumiError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Tunables for a crawl that are not part of the call itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// How long a cancelled crawl waits for in-flight workers
    pub grace_period: Duration,
    /// Only follow links on the seed's host
    pub same_host_only: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

impl From<&CrawlConfig> for CrawlOptions {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            grace_period: Duration::from_secs(config.grace_period_secs),
            same_host_only: config.same_host_only,
        }
    }
}

/// What one crawl did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Documents added to the index during this crawl
    pub documents_indexed: usize,
    /// Pages whose fetch failed
    pub pages_failed: usize,
    /// Fetch attempts that finished, successful or not
    pub pages_visited: usize,
    /// Whether the crawl was stopped before its frontier emptied
    pub cancelled: bool,
}

/// Stops a running crawl from outside
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// No new work is scheduled after this; in-flight pages may finish
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

#[derive(Debug, Clone)]
struct WorkUnit {
    url: Url,
    depth: u32,
}

enum WorkOutcome {
    Indexed { doc_id: DocId, links: Vec<WorkUnit> },
    Listed { links: Vec<WorkUnit> },
    FetchFailed { url: Url, error: FetchError },
    StorageFailed { url: Url, error: StorageError },
}

struct WorkerContext {
    index: InvertedIndex,
    fetcher: Arc<dyn PageFetcher>,
    state: CrawlState,
    seed: Url,
    max_depth: u32,
    same_host_only: bool,
}

/// Crawls pages into an index
///
/// Once cancelled, a crawler stays cancelled.
pub struct Crawler {
    index: InvertedIndex,
    fetcher: Arc<dyn PageFetcher>,
    options: CrawlOptions,
    cancel: Arc<watch::Sender<bool>>,
}

impl Crawler {
    pub fn new(index: InvertedIndex, fetcher: Arc<dyn PageFetcher>, options: CrawlOptions) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            index,
            fetcher,
            options,
            cancel: Arc::new(tx),
        }
    }

    /// Returns a handle that can cancel this crawler's crawls
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    /// Crawls from `seed` up to `max_depth` hops away
    ///
    /// The seed is at depth 0. Pages at `max_depth` are indexed but their
    /// links are not followed. Each URL is fetched at most once. A page that
    /// cannot be fetched is logged and skipped; a failure to write the index
    /// stops the crawl and is returned once in-flight workers finish.
    ///
    /// # Arguments
    ///
    /// * `seed` - Starting URL (http, https or file)
    /// * `max_depth` - Maximum hops from the seed
    /// * `max_workers` - Maximum concurrent fetch-and-index tasks
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl finished or was cancelled
    /// * `Err(SumiError)` - The seed is invalid or the index could not be written
    pub async fn crawl(
        &self,
        seed: &Url,
        max_depth: u32,
        max_workers: usize,
    ) -> Result<CrawlSummary, SumiError> {
        let seed = normalize_parsed(seed.clone())?;
        let mut cancel_rx = self.cancel.subscribe();
        let mut summary = CrawlSummary::default();

        if *cancel_rx.borrow_and_update() {
            info!("Crawler already cancelled, not starting {}", seed);
            summary.cancelled = true;
            return Ok(summary);
        }

        let state = CrawlState::new(max_workers);
        let context = Arc::new(WorkerContext {
            index: self.index.clone(),
            fetcher: Arc::clone(&self.fetcher),
            state: state.clone(),
            seed: seed.clone(),
            max_depth,
            same_host_only: self.options.same_host_only,
        });

        info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            seed, max_depth, max_workers
        );
        let started = Instant::now();

        state.try_visit(&seed);
        let mut frontier = VecDeque::from([WorkUnit {
            url: seed,
            depth: 0,
        }]);
        let mut workers: JoinSet<WorkOutcome> = JoinSet::new();
        let mut storage_failure: Option<StorageError> = None;

        loop {
            if storage_failure.is_none() {
                while !frontier.is_empty() {
                    let Some(slot) = state.try_acquire_worker() else {
                        break;
                    };
                    let Some(unit) = frontier.pop_front() else {
                        break;
                    };
                    trace!("Scheduling {} at depth {}", unit.url, unit.depth);
                    workers.spawn(process(Arc::clone(&context), unit, slot));
                }
            }

            if workers.is_empty() {
                break;
            }

            tokio::select! {
                Some(joined) = workers.join_next() => {
                    record(joined, &mut summary, &mut frontier, &mut storage_failure);
                }
                changed = cancel_rx.changed() => {
                    if changed.is_err() || *cancel_rx.borrow() {
                        summary.cancelled = true;
                        break;
                    }
                }
            }
        }

        if summary.cancelled {
            info!(
                "Crawl cancelled, waiting up to {:?} for {} workers",
                self.options.grace_period,
                workers.len()
            );
            let drain = async {
                while let Some(joined) = workers.join_next().await {
                    record(joined, &mut summary, &mut frontier, &mut storage_failure);
                }
            };
            if tokio::time::timeout(self.options.grace_period, drain).await.is_err() {
                warn!("Grace period elapsed, aborting remaining workers");
                workers.abort_all();
                // Workers that finished before the abort still report
                while let Some(joined) = workers.join_next().await {
                    record(joined, &mut summary, &mut frontier, &mut storage_failure);
                }
            }
        }

        info!(
            "Crawl finished in {:.2}s: {} documents indexed, {} pages failed, {} URLs seen",
            started.elapsed().as_secs_f64(),
            summary.documents_indexed,
            summary.pages_failed,
            state.visited_count()
        );

        match storage_failure {
            Some(error) => Err(error.into()),
            None => Ok(summary),
        }
    }
}

fn record(
    joined: Result<WorkOutcome, JoinError>,
    summary: &mut CrawlSummary,
    frontier: &mut VecDeque<WorkUnit>,
    storage_failure: &mut Option<StorageError>,
) {
    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => {
            debug!("Crawl worker aborted");
            return;
        }
        Err(e) => {
            warn!("Crawl worker did not finish: {}", e);
            summary.pages_failed += 1;
            return;
        }
    };

    summary.pages_visited += 1;
    match outcome {
        WorkOutcome::Indexed { doc_id, links } => {
            trace!("Document {} indexed, {} new links", doc_id, links.len());
            summary.documents_indexed += 1;
            frontier.extend(links);
        }
        WorkOutcome::Listed { links } => frontier.extend(links),
        WorkOutcome::FetchFailed { url, error } => {
            warn!("Failed to fetch {}: {}", url, error);
            summary.pages_failed += 1;
        }
        WorkOutcome::StorageFailed { url, error } => {
            error!("Failed to index {}: {}", url, error);
            if storage_failure.is_none() {
                *storage_failure = Some(error);
            }
        }
    }
}

async fn process(context: Arc<WorkerContext>, unit: WorkUnit, slot: WorkerSlot) -> WorkOutcome {
    let _slot = slot;

    let page = match context.fetcher.fetch(&unit.url).await {
        Ok(page) => page,
        Err(error) => {
            return WorkOutcome::FetchFailed {
                url: unit.url,
                error,
            }
        }
    };

    let doc_id = if page.is_indexable() {
        match context
            .index
            .add_document(&page.title, &document_path(&unit.url), &page.text)
        {
            Ok(id) => Some(id),
            Err(error) => {
                return WorkOutcome::StorageFailed {
                    url: unit.url,
                    error,
                }
            }
        }
    } else {
        None
    };

    let links = follow_links(&context, &unit, page);
    match doc_id {
        Some(doc_id) => WorkOutcome::Indexed { doc_id, links },
        None => WorkOutcome::Listed { links },
    }
}

/// Claims the page's unvisited links as work one level deeper
fn follow_links(context: &WorkerContext, unit: &WorkUnit, page: PageContent) -> Vec<WorkUnit> {
    if unit.depth >= context.max_depth {
        debug!("Depth {} reached at {}, links not followed", unit.depth, unit.url);
        return Vec::new();
    }

    page.links
        .into_iter()
        .filter(|link| !context.same_host_only || same_host(link, &context.seed))
        .filter(|link| context.state.try_visit(link))
        .map(|url| WorkUnit {
            url,
            depth: unit.depth + 1,
        })
        .collect()
}

/// Local files are recorded by filesystem path, everything else by URL
fn document_path(url: &Url) -> String {
    if url.scheme() == "file" {
        if let Ok(path) = url.to_file_path() {
            return path.display().to_string();
        }
    }
    url.to_string()
}
