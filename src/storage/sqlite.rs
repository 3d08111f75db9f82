//! SQLite storage implementation
//!
//! This module provides the SQLite-backed implementation of the IndexStore trait.

use crate::index::{DocId, Document, TermOffset};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    IndexStore, StorageError, StorageResult, StoreSnapshot, StoreVersion,
};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Name of the database file inside the index directory
pub const INDEX_FILE_NAME: &str = "index.db";

/// SQLite storage backend for one index directory
pub struct SqliteIndexStore {
    conn: Connection,
    writable: bool,
}

impl SqliteIndexStore {
    /// Opens or creates the index database inside `dir`
    ///
    /// The directory is created if absent. If anything fails after the
    /// directory was created here, it is removed again so no partial index
    /// is left on disk.
    ///
    /// # Arguments
    ///
    /// * `dir` - Index directory
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteIndexStore)` - Store ready for appends
    /// * `Err(StorageError)` - The path is unusable or the database is corrupt
    pub fn open(dir: &Path) -> StorageResult<Self> {
        check_directory_path(dir)?;

        let created = !dir.exists();
        fs::create_dir_all(dir).map_err(|e| invalid_path(dir, e.to_string()))?;

        match Self::open_writable(&index_file(dir)) {
            Ok(store) => {
                info!("Opened index store at {}", dir.display());
                Ok(store)
            }
            Err(e) => {
                if created {
                    let _ = fs::remove_dir_all(dir);
                }
                Err(e)
            }
        }
    }

    /// Opens an existing index database without creating anything
    ///
    /// Used by readers that load the index from disk rather than from a
    /// live writer handle.
    pub fn open_existing(dir: &Path) -> StorageResult<Self> {
        check_directory_path(dir)?;

        let path = index_file(dir);
        if !path.is_file() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA query_only = ON;")?;
        verify_schema(&conn)?;

        Ok(Self {
            conn,
            writable: false,
        })
    }

    /// Creates an in-memory store, used for indexes that are never persisted
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            writable: true,
        })
    }

    fn open_writable(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            writable: true,
        })
    }
}

impl IndexStore for SqliteIndexStore {
    /// Reads the version, documents and postings inside one read
    /// transaction, so a writer committing in between is either wholly
    /// visible or not at all.
    fn load_snapshot(&self, first_id: DocId) -> StorageResult<StoreSnapshot> {
        let tx = self.conn.unchecked_transaction()?;

        let version = read_version(&tx)?;
        let documents = read_documents(&tx, first_id)?;
        tx.commit()?;

        debug!(
            "Loaded {} documents starting at id {} ({} stored)",
            documents.len(),
            first_id,
            version.documents
        );
        Ok(StoreSnapshot { version, documents })
    }

    fn version(&self) -> StorageResult<StoreVersion> {
        read_version(&self.conn)
    }

    fn append_document(&mut self, document: &Document) -> StorageResult<()> {
        if !self.writable {
            return Err(StorageError::Closed);
        }

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO documents (id, title, path, contents, indexed_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                i64::from(document.id),
                document.title,
                document.path,
                document.contents,
                now
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO postings (term, doc_id, frequency, offsets) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (term, offsets) in &document.term_positions {
                let encoded = serde_json::to_string(offsets)?;
                stmt.execute(params![
                    term,
                    i64::from(document.id),
                    offsets.len() as i64,
                    encoded
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        let SqliteIndexStore { conn, writable } = *self;
        if writable {
            conn.execute_batch("PRAGMA optimize;")?;
        }
        conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }
}

fn read_version(conn: &Connection) -> StorageResult<StoreVersion> {
    let (count, created_at): (i64, Option<String>) = conn.query_row(
        "SELECT COUNT(*), (SELECT indexed_at FROM documents ORDER BY id LIMIT 1) FROM documents",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(StoreVersion {
        documents: count.max(0) as u64,
        created_at,
    })
}

/// Documents with `id >= first_id` and their postings
fn read_documents(conn: &Connection, first_id: DocId) -> StorageResult<Vec<Document>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, path, contents FROM documents WHERE id >= ?1 ORDER BY id",
    )?;

    let rows = stmt.query_map(params![i64::from(first_id)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut documents = Vec::new();
    for row in rows {
        let (id, title, path, contents) = row?;
        let expected = i64::from(first_id) + documents.len() as i64;
        if id != expected {
            return Err(StorageError::Corrupt(format!(
                "document ids are not contiguous: expected {}, found {}",
                expected, id
            )));
        }
        documents.push(Document {
            id: to_doc_id(id)?,
            title,
            path,
            contents,
            term_positions: Default::default(),
        });
    }

    if documents.is_empty() {
        return Ok(documents);
    }

    let mut stmt = conn.prepare(
        "SELECT term, doc_id, frequency, offsets FROM postings WHERE doc_id >= ?1 AND doc_id < ?2",
    )?;
    let end_id = i64::from(first_id) + documents.len() as i64;

    let rows = stmt.query_map(params![i64::from(first_id), end_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    for row in rows {
        let (term, doc_id, frequency, offsets) = row?;
        let offsets: Vec<TermOffset> = serde_json::from_str(&offsets)?;

        if offsets.len() as i64 != frequency {
            return Err(StorageError::Corrupt(format!(
                "posting ({}, {}) records {} occurrences but stores {} offsets",
                term,
                doc_id,
                frequency,
                offsets.len()
            )));
        }

        let slot = usize::try_from(doc_id - i64::from(first_id))
            .ok()
            .and_then(|i| documents.get_mut(i))
            .ok_or_else(|| {
                StorageError::Corrupt(format!(
                    "posting for term '{}' references missing document {}",
                    term, doc_id
                ))
            })?;
        slot.term_positions.insert(term, offsets);
    }

    Ok(documents)
}

fn index_file(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE_NAME)
}

fn invalid_path(dir: &Path, reason: impl Into<String>) -> StorageError {
    StorageError::InvalidPath {
        path: dir.display().to_string(),
        reason: reason.into(),
    }
}

fn check_directory_path(dir: &Path) -> StorageResult<()> {
    if dir.as_os_str().is_empty() {
        return Err(invalid_path(dir, "path is empty"));
    }
    if dir.exists() && !dir.is_dir() {
        return Err(invalid_path(dir, "not a directory"));
    }
    Ok(())
}

fn verify_schema(conn: &Connection) -> StorageResult<()> {
    let tables: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('documents', 'postings')",
        [],
        |row| row.get(0),
    )?;
    if tables != 2 {
        return Err(StorageError::Corrupt(
            "index database is missing its tables".to_string(),
        ));
    }
    Ok(())
}

fn to_doc_id(id: i64) -> StorageResult<DocId> {
    DocId::try_from(id).map_err(|_| StorageError::Corrupt(format!("document id {} out of range", id)))
}
