//! Storage module for persisting the inverted index
//!
//! This module handles the index backing store:
//! - SQLite database initialization and schema management
//! - Atomic document and posting appends
//! - Loading stored documents for writers reopening an index and for readers

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{SqliteIndexStore, INDEX_FILE_NAME};
pub use traits::{IndexStore, StorageError, StorageResult, StoreSnapshot, StoreVersion};
