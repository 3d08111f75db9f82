//! Storage traits and error types
//!
//! This module defines the trait interface for index backing stores and
//! associated error types.

use crate::index::{DocId, Document};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid index path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Index not found at {0}")]
    NotFound(String),

    #[error("Index is closed")]
    Closed,

    #[error("Corrupt index: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Identity of the stored contents at one point in time
///
/// Stores are append-only, so an unchanged version means unchanged
/// contents. A rebuilt index gets a new `created_at` even if it ends up
/// with the same number of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreVersion {
    /// Documents stored
    pub documents: u64,
    /// When the first document was stored
    pub created_at: Option<String>,
}

impl StoreVersion {
    /// Whether `self` cannot be reached from `earlier` by appends alone
    pub fn replaces(&self, earlier: &StoreVersion) -> bool {
        self.documents < earlier.documents
            || (earlier.created_at.is_some() && self.created_at != earlier.created_at)
    }
}

/// Documents read under one consistent view of a store
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Version of the whole store at the time of the read
    pub version: StoreVersion,
    /// Stored documents from the requested id on, ordered by id
    pub documents: Vec<Document>,
}

/// Trait for index backing store implementations
///
/// A store only ever receives whole documents; it never sees a document
/// mid-construction. Implementations are owned by a single writer, while
/// any number of read-only handles may load from the same store.
pub trait IndexStore: Send {
    /// Loads stored documents with `id >= first_id` with their term offsets,
    /// together with the store version they were read at
    fn load_snapshot(&self, first_id: DocId) -> StorageResult<StoreSnapshot>;

    /// Loads stored documents with `id >= first_id`, ordered by id
    fn load_documents(&self, first_id: DocId) -> StorageResult<Vec<Document>> {
        Ok(self.load_snapshot(first_id)?.documents)
    }

    /// Current version of the stored contents
    fn version(&self) -> StorageResult<StoreVersion>;

    /// Persists a document and its postings atomically
    fn append_document(&mut self, document: &Document) -> StorageResult<()>;

    /// Number of documents currently stored
    fn document_count(&self) -> StorageResult<u64> {
        Ok(self.version()?.documents)
    }

    /// Flushes and releases the store
    fn close(self: Box<Self>) -> StorageResult<()>;
}
