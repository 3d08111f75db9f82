//! Integration tests for the persistent inverted index

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use sumi_search::index::{DocId, IndexReader, InvertedIndex};
use sumi_search::output::load_statistics;
use sumi_search::search::QueryEngine;
use sumi_search::storage::{StorageError, INDEX_FILE_NAME};
use tempfile::TempDir;

#[test]
fn test_concurrent_adds_get_unique_ids() {
    let tmp = TempDir::new().unwrap();
    let index = InvertedIndex::open(tmp.path()).unwrap();

    let ids: Vec<DocId> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let index = index.clone();
                scope.spawn(move || {
                    (0..25)
                        .map(|i| {
                            index
                                .add_document(
                                    &format!("t{} d{}", t, i),
                                    &format!("thread{}/doc{}", t, i),
                                    &format!("shared words thread{} item{}", t, i),
                                )
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: BTreeSet<DocId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 200);
    assert_eq!(unique, (0..200).collect::<BTreeSet<DocId>>());
    assert_eq!(index.doc_count(), 200);
    index.close().unwrap();

    let reader = IndexReader::open(tmp.path()).unwrap();
    assert_eq!(reader.doc_count(), 200);
    assert_eq!(reader.doc_freq("shared"), 200);
    assert_eq!(reader.doc_freq("thread3"), 25);

    // Every posting resolves to a document that contains the term
    let engine = QueryEngine::new();
    for (term, doc_freq, _) in reader.term_stats() {
        let query = engine.parse(term).unwrap();
        let top = engine.search(&reader, &query, usize::MAX);
        assert_eq!(top.total_hits, doc_freq);
        for hit in top.hits {
            let document = reader.document(hit.doc_id).unwrap();
            assert!(document.term_frequency(term) > 0);
        }
    }

    let stats = load_statistics(&reader, 5);
    let distinct_per_doc: u64 = (0..200)
        .filter_map(|id| reader.document(id))
        .map(|d| d.term_positions.len() as u64)
        .sum();
    assert_eq!(stats.total_postings, distinct_per_doc);
}

#[test]
fn test_reopen_continues_ids() {
    let tmp = TempDir::new().unwrap();

    let index = InvertedIndex::open(tmp.path()).unwrap();
    assert_eq!(index.add_document("A", "a", "first text").unwrap(), 0);
    assert_eq!(index.add_document("B", "b", "second text").unwrap(), 1);
    index.close().unwrap();

    let index = InvertedIndex::open(tmp.path()).unwrap();
    assert_eq!(index.doc_count(), 2);
    assert_eq!(index.add_document("C", "c", "third text").unwrap(), 2);

    // The same source indexed again is a new document
    assert_eq!(index.add_document("A", "a", "first text").unwrap(), 3);
    index.close().unwrap();

    let reader = IndexReader::open(tmp.path()).unwrap();
    assert_eq!(reader.doc_count(), 4);
    assert_eq!(reader.doc_freq("text"), 4);
    assert_eq!(reader.document(2).unwrap().title, "C");
}

#[test]
fn test_file_is_not_an_index_directory() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("plain.txt");
    std::fs::write(&file, "not a directory").unwrap();

    let err = InvertedIndex::open(&file).unwrap_err();
    assert!(matches!(err, StorageError::InvalidPath { .. }));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "not a directory");

    let nested = file.join("index");
    assert!(matches!(
        InvertedIndex::open(&nested),
        Err(StorageError::InvalidPath { .. })
    ));
    assert!(!nested.exists());
}

#[test]
fn test_corrupt_database_is_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(INDEX_FILE_NAME),
        "this is certainly not a sqlite database file, just some text",
    )
    .unwrap();

    assert!(InvertedIndex::open(tmp.path()).is_err());
    assert!(IndexReader::open(tmp.path()).is_err());
    assert!(tmp.path().exists());
}

#[test]
fn test_stored_reader_picks_up_new_documents() {
    let tmp = TempDir::new().unwrap();
    let index = InvertedIndex::open(tmp.path()).unwrap();
    index.add_document("One", "one", "alpha").unwrap();

    let mut reader = IndexReader::open(tmp.path()).unwrap();
    assert_eq!(reader.doc_count(), 1);
    assert!(!reader.refresh_if_changed().unwrap());

    index.add_document("Two", "two", "alpha beta").unwrap();
    index.add_document("Three", "three", "beta").unwrap();

    let before = reader.clone();
    assert!(reader.refresh_if_changed().unwrap());
    assert_eq!(reader.doc_count(), 3);
    assert_eq!(reader.doc_freq("beta"), 2);

    // Earlier clones keep their own view
    assert_eq!(before.doc_count(), 1);
    index.close().unwrap();
}

#[test]
fn test_live_snapshots_never_see_partial_documents() {
    let index = InvertedIndex::in_memory().unwrap();

    thread::scope(|scope| {
        let writer = index.clone();
        scope.spawn(move || {
            for i in 0..100 {
                writer
                    .add_document(&format!("d{}", i), &format!("p{}", i), "one two three")
                    .unwrap();
            }
        });

        let mut reader = index.open_reader_snapshot();
        let mut seen = HashSet::new();
        while reader.doc_count() < 100 {
            reader.refresh_if_changed().unwrap();
            let count = reader.doc_count();
            seen.insert(count);
            for term in ["one", "two", "three"] {
                assert_eq!(reader.doc_freq(term), count);
            }
        }
        assert!(seen.contains(&100));
    });
}

#[test]
fn test_stored_readers_run_alongside_writer() {
    let tmp = TempDir::new().unwrap();
    let index = InvertedIndex::open(tmp.path()).unwrap();
    index.add_document("Seed", "seed", "shared seed").unwrap();

    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        let writer = index.clone();
        let done = &done;
        scope.spawn(move || {
            for i in 1..400 {
                writer
                    .add_document(
                        &format!("d{}", i),
                        &format!("p{}", i),
                        &format!("shared alpha beta gamma item{}", i),
                    )
                    .unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        let mut refreshed = IndexReader::open(tmp.path()).unwrap();
        while !done.load(Ordering::SeqCst) {
            let fresh = IndexReader::open(tmp.path())
                .unwrap_or_else(|e| panic!("reader failed during writes: {}", e));
            assert_eq!(fresh.doc_freq("shared"), fresh.doc_count());

            refreshed
                .refresh_if_changed()
                .unwrap_or_else(|e| panic!("refresh failed during writes: {}", e));
            assert_eq!(refreshed.doc_freq("shared"), refreshed.doc_count());
        }
    });

    let reader = IndexReader::open(tmp.path()).unwrap();
    assert_eq!(reader.doc_count(), 400);
    assert_eq!(reader.doc_freq("alpha"), 399);
    index.close().unwrap();
}
