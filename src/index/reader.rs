//! Read-only snapshots of an inverted index

use crate::index::document::{DocId, Document};
use crate::index::postings::{IndexState, PostingList};
use crate::index::writer::Shared;
use crate::storage::{IndexStore, SqliteIndexStore, StorageError, StoreVersion};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
enum ReaderSource {
    /// Snapshots of a writer in this process
    Live(Arc<Shared>),
    /// The index stored in a directory, last read at `version`
    Stored { dir: PathBuf, version: StoreVersion },
}

/// A point-in-time view of an index
///
/// The view never changes on its own. Call
/// [`IndexReader::refresh_if_changed`] to pick up documents added since.
#[derive(Clone)]
pub struct IndexReader {
    state: Arc<IndexState>,
    source: ReaderSource,
}

impl IndexReader {
    pub(crate) fn live(shared: Arc<Shared>) -> Self {
        Self {
            state: shared.snapshot(),
            source: ReaderSource::Live(shared),
        }
    }

    /// Opens a reader over the index stored in `dir`
    ///
    /// Works while a writer in another handle or process is appending; the
    /// reader sees every document committed before its read started.
    /// Fails with [`StorageError::NotFound`] if nothing was ever indexed there.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        let store = SqliteIndexStore::open_existing(dir)?;
        let snapshot = store.load_snapshot(0)?;
        Box::new(store).close()?;

        let state = IndexState::from_documents(snapshot.documents)?;
        debug!(
            "Opened reader on {} with {} documents",
            dir.display(),
            state.doc_count()
        );

        Ok(Self {
            state: Arc::new(state),
            source: ReaderSource::Stored {
                dir: dir.to_path_buf(),
                version: snapshot.version,
            },
        })
    }

    /// Moves the snapshot forward if the index changed since it was taken
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The reader now sees newer documents
    /// * `Ok(false)` - Nothing changed
    /// * `Err(StorageError)` - The stored index could not be read
    pub fn refresh_if_changed(&mut self) -> Result<bool, StorageError> {
        match &mut self.source {
            ReaderSource::Live(shared) => {
                let latest = shared.snapshot();
                if latest.doc_count() == self.state.doc_count() {
                    return Ok(false);
                }
                self.state = latest;
            }
            ReaderSource::Stored { dir, version } => {
                let store = SqliteIndexStore::open_existing(dir)?;
                let loaded = load_changes(&store, &self.state, version);
                Box::new(store).close()?;

                let Some((next, latest)) = loaded? else {
                    return Ok(false);
                };
                self.state = Arc::new(next);
                *version = latest;
            }
        }

        debug!("Reader refreshed to {} documents", self.state.doc_count());
        Ok(true)
    }

    /// Number of documents visible to this reader
    pub fn doc_count(&self) -> usize {
        self.state.doc_count()
    }

    /// Looks up a document by id
    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.state.document(id)
    }

    /// Number of documents containing `term`
    pub fn doc_freq(&self, term: &str) -> usize {
        self.state.postings(term).len()
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.state.terms().count()
    }

    /// Every term with its document frequency and total occurrences
    pub fn term_stats(&self) -> impl Iterator<Item = (&str, usize, u64)> {
        self.state.terms().map(|(term, postings)| {
            let occurrences = postings.iter().map(|p| u64::from(p.term_frequency)).sum();
            (term, postings.len(), occurrences)
        })
    }

    pub(crate) fn postings(&self, term: &str) -> PostingList<'_> {
        self.state.postings(term)
    }
}

/// Reads what changed in `store` since `seen`
///
/// Appends extend a clone of `state`; a rebuilt index is loaded from
/// scratch. Returns `None` when the store is still at `seen`.
fn load_changes(
    store: &SqliteIndexStore,
    state: &IndexState,
    seen: &StoreVersion,
) -> Result<Option<(IndexState, StoreVersion)>, StorageError> {
    if store.version()? == *seen {
        return Ok(None);
    }

    let snapshot = store.load_snapshot(state.next_id())?;
    if !snapshot.version.replaces(seen) {
        let mut next = state.clone();
        next.append(snapshot.documents)?;
        return Ok(Some((next, snapshot.version)));
    }

    debug!("Stored index was rebuilt, reloading");
    let snapshot = store.load_snapshot(0)?;
    Ok(Some((
        IndexState::from_documents(snapshot.documents)?,
        snapshot.version,
    )))
}
