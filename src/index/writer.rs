//! The single writer handle of an inverted index

use crate::index::document::{DocId, Document};
use crate::index::postings::IndexState;
use crate::index::reader::IndexReader;
use crate::storage::{IndexStore, SqliteIndexStore, StorageError};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

pub(crate) struct Shared {
    /// Serializes `add_document` and `close`; `None` once closed
    writer: Mutex<Option<Box<dyn IndexStore>>>,
    /// Last published state, swapped only while `writer` is held
    published: RwLock<Arc<IndexState>>,
}

impl Shared {
    pub fn snapshot(&self) -> Arc<IndexState> {
        Arc::clone(&self.published.read())
    }
}

/// Handle to an inverted index
///
/// Clones share the same writer. Any number of tasks may call
/// [`InvertedIndex::add_document`] concurrently; the calls are serialized
/// internally, and readers never see a partially added document.
#[derive(Clone)]
pub struct InvertedIndex {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for InvertedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvertedIndex").finish_non_exhaustive()
    }
}

impl InvertedIndex {
    /// Opens the index stored in `dir`, creating it if absent
    ///
    /// Existing documents are loaded and new ones continue after the
    /// highest stored id.
    ///
    /// # Arguments
    ///
    /// * `dir` - Index directory
    ///
    /// # Returns
    ///
    /// * `Ok(InvertedIndex)` - Writer handle ready for appends
    /// * `Err(StorageError)` - The directory cannot be used or its contents are corrupt
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        let store = SqliteIndexStore::open(dir)?;
        let index = Self::with_store(Box::new(store))?;
        info!(
            "Index at {} opened with {} documents",
            dir.display(),
            index.doc_count()
        );
        Ok(index)
    }

    /// Creates an index that lives only in memory
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_store(Box::new(SqliteIndexStore::open_in_memory()?))
    }

    /// Creates an index over any backing store
    pub fn with_store(store: Box<dyn IndexStore>) -> Result<Self, StorageError> {
        let state = IndexState::from_documents(store.load_documents(0)?)?;

        Ok(Self {
            shared: Arc::new(Shared {
                writer: Mutex::new(Some(store)),
                published: RwLock::new(Arc::new(state)),
            }),
        })
    }

    /// Tokenizes and appends a document, returning its new id
    ///
    /// The document is persisted before it is published to readers. If
    /// persisting fails, the index is left as it was.
    pub fn add_document(
        &self,
        title: &str,
        path: &str,
        contents: &str,
    ) -> Result<DocId, StorageError> {
        let mut document =
            Document::build(0, title.to_string(), path.to_string(), contents.to_string());

        let mut writer = self.shared.writer.lock();
        let store = writer.as_mut().ok_or(StorageError::Closed)?;

        let id = self.shared.published.read().next_id();
        document.id = id;

        if let Err(e) = store.append_document(&document) {
            error!("Failed to persist document {} ({}): {}", id, path, e);
            return Err(e);
        }

        // Segments are shared, so the new state costs a few `Arc` clones;
        // the publish lock is held only for the swap
        let mut next = IndexState::clone(&self.shared.snapshot());
        next.push(document)?;
        *self.shared.published.write() = Arc::new(next);

        debug!("Indexed document {} ({})", id, path);
        Ok(id)
    }

    /// Returns a point-in-time reader over everything added so far
    pub fn open_reader_snapshot(&self) -> IndexReader {
        IndexReader::live(Arc::clone(&self.shared))
    }

    /// Number of documents in the index
    pub fn doc_count(&self) -> usize {
        self.shared.snapshot().doc_count()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.shared.writer.lock().is_none()
    }

    /// Flushes and releases the backing store
    ///
    /// Readers already opened keep working; further writes fail with
    /// [`StorageError::Closed`].
    pub fn close(&self) -> Result<(), StorageError> {
        let store = self.shared.writer.lock().take().ok_or(StorageError::Closed)?;
        store.close()?;
        info!("Index closed with {} documents", self.doc_count());
        Ok(())
    }
}
