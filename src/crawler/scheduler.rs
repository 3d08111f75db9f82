//! Shared crawl bookkeeping
//!
//! The visited set and the active worker count live behind one lock so
//! that "have we seen this URL" and "claim it" happen as a single step.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

#[derive(Debug)]
struct Inner {
    visited: HashSet<Url>,
    active_workers: usize,
    max_workers: usize,
}

/// State shared by all workers of one crawl
#[derive(Debug, Clone)]
pub struct CrawlState {
    inner: Arc<Mutex<Inner>>,
}

/// A claimed worker slot, released on drop
#[derive(Debug)]
pub struct WorkerSlot {
    inner: Arc<Mutex<Inner>>,
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        inner.active_workers = inner.active_workers.saturating_sub(1);
    }
}

impl CrawlState {
    pub fn new(max_workers: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                visited: HashSet::new(),
                active_workers: 0,
                max_workers: max_workers.max(1),
            })),
        }
    }

    /// Marks `url` visited. Returns false if some worker already claimed it.
    pub fn try_visit(&self, url: &Url) -> bool {
        self.inner.lock().visited.insert(url.clone())
    }

    /// Claims a worker slot if fewer than `max_workers` are active
    pub fn try_acquire_worker(&self) -> Option<WorkerSlot> {
        let mut inner = self.inner.lock();
        if inner.active_workers >= inner.max_workers {
            return None;
        }
        inner.active_workers += 1;
        Some(WorkerSlot {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn active_workers(&self) -> usize {
        self.inner.lock().active_workers
    }

    pub fn visited_count(&self) -> usize {
        self.inner.lock().visited.len()
    }
}
