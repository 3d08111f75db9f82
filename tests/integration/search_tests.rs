//! Integration tests for querying an index
//!
//! Documents are written through the public index API (and, for the
//! end-to-end case, crawled from a mock server) and then queried through
//! the search orchestrator the CLI uses.

use std::path::Path;
use sumi_search::config::{
    Config, CrawlConfig, IndexConfig, OsPathResolver, SearchConfig, UserAgentConfig,
};
use sumi_search::index::InvertedIndex;
use sumi_search::search::{HighlightConfig, Highlighter, QueryEngine};
use sumi_search::{
    ErrorCategory, IndexOrchestrator, QuerySyntaxError, SearchOrchestrator, SumiError,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(index_dir: &Path, page_size: usize) -> Config {
    Config {
        index: IndexConfig {
            directory: index_dir.display().to_string(),
            directory_windows: None,
            directory_unix: None,
        },
        crawl: CrawlConfig::default(),
        search: SearchConfig {
            page_size,
            ..SearchConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
    }
}

/// Writes `docs` as (title, contents) into a fresh index at `dir`
fn build_index(dir: &Path, docs: &[(&str, &str)]) {
    let index = InvertedIndex::open(dir).unwrap();
    for (i, (title, contents)) in docs.iter().enumerate() {
        index
            .add_document(title, &format!("doc/{}", i), contents)
            .unwrap();
    }
    index.close().unwrap();
}

#[tokio::test]
async fn test_crawled_page_is_searchable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fox"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><title>Fox</title></head>\
             <body><p>the quick brown fox</p></body></html>",
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(tmp.path(), 10);
    let resolver = OsPathResolver::default();

    let report = IndexOrchestrator::new(&config, &resolver)
        .unwrap()
        .index_with(&format!("{}/fox", mock_server.uri()), 0, 1)
        .await
        .unwrap();
    assert_eq!(report.documents, 1);

    let search = SearchOrchestrator::new(&config, &resolver);

    let page = search.search("quick fox", 0).unwrap();
    assert_eq!(page.total_hits, 1);
    assert_eq!(page.results[0].title, "Fox");
    assert_eq!(page.results[0].path, format!("{}/fox", mock_server.uri()));

    assert_eq!(search.search("\"quick brown\"", 0).unwrap().total_hits, 1);
    assert_eq!(search.search("quick jumps", 0).unwrap().total_hits, 0);
    assert_eq!(search.search("\"brown quick\"", 0).unwrap().total_hits, 0);
}

#[test]
fn test_fragments_highlight_every_matched_term() {
    let tmp = TempDir::new().unwrap();
    let filler = "lorem ipsum dolor sit amet ".repeat(20);
    let contents = format!(
        "{filler} the heron waits {filler} a heron fishes {filler} herons and a heron"
    );
    build_index(tmp.path(), &[("Birds", contents.as_str())]);

    let config = create_test_config(tmp.path(), 10);
    let search = SearchOrchestrator::new(&config, &OsPathResolver::default());

    let page = search.search("heron", 0).unwrap();
    assert_eq!(page.total_hits, 1);

    let fragment = &page.results[0].fragment;
    let highlight = HighlightConfig::default();
    assert!(fragment.contains(&format!("{}heron{}", highlight.pre_tag, highlight.post_tag)));
    assert!(fragment.split(&highlight.separator).count() <= highlight.max_fragments);

    // Only whole-token matches are marked
    assert!(!fragment.contains(&format!("{}herons", highlight.pre_tag)));
    let bare = fragment
        .replace(&highlight.pre_tag, "")
        .replace(&highlight.post_tag, "");
    for piece in bare.split(&highlight.separator) {
        assert!(contents.contains(piece), "fragment piece not in document: {}", piece);
    }
}

#[test]
fn test_syntax_error_leaves_index_untouched() {
    let tmp = TempDir::new().unwrap();
    build_index(tmp.path(), &[("One", "an unterminated thought"), ("Two", "phrase book")]);

    let config = create_test_config(tmp.path(), 10);
    let search = SearchOrchestrator::new(&config, &OsPathResolver::default());

    let err = search.search("\"unterminated phrase", 0).unwrap_err();
    assert!(matches!(
        err,
        SumiError::QuerySyntax(QuerySyntaxError::UnterminatedPhrase { .. })
    ));
    assert_eq!(err.category(), ErrorCategory::QuerySyntax);

    let page = search.search("phrase", 0).unwrap();
    assert_eq!(page.total_hits, 1);
    assert_eq!(page.results[0].title, "Two");
    assert_eq!(search.sent_queries(), vec!["phrase"]);
}

#[test]
fn test_pages_partition_the_ranking() {
    let tmp = TempDir::new().unwrap();
    let docs: Vec<(String, String)> = (0..7)
        .map(|i| (format!("Doc {}", i), "match ".repeat(i + 1)))
        .collect();
    let borrowed: Vec<(&str, &str)> = docs
        .iter()
        .map(|(t, c)| (t.as_str(), c.as_str()))
        .collect();
    build_index(tmp.path(), &borrowed);

    let config = create_test_config(tmp.path(), 3);
    let search = SearchOrchestrator::new(&config, &OsPathResolver::default());

    let mut seen = Vec::new();
    for page_number in 0..3 {
        let page = search.search("match", page_number).unwrap();
        assert_eq!(page.total_hits, 7);
        assert_eq!(page.total_pages(), 3);
        seen.extend(page.results.into_iter().map(|r| r.title));
    }

    let expected: Vec<String> = (0..7).rev().map(|i| format!("Doc {}", i)).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_search_sees_documents_written_after_first_query() {
    let tmp = TempDir::new().unwrap();
    build_index(tmp.path(), &[("Early", "early bird")]);

    let config = create_test_config(tmp.path(), 10);
    let search = SearchOrchestrator::new(&config, &OsPathResolver::default());
    assert_eq!(search.search("worm", 0).unwrap().total_hits, 0);

    let index = InvertedIndex::open(tmp.path()).unwrap();
    index.add_document("Late", "doc/late", "catches the worm").unwrap();
    index.close().unwrap();

    let page = search.search("worm", 0).unwrap();
    assert_eq!(page.total_hits, 1);
    assert_eq!(page.results[0].title, "Late");
}

#[test]
fn test_added_document_is_found_after_refresh() {
    let index = InvertedIndex::in_memory().unwrap();
    let engine = QueryEngine::new();
    let highlighter = Highlighter::new(HighlightConfig::default());

    let mut reader = index.open_reader_snapshot();
    let id = index
        .add_document("Otters", "otters", "river otters hold hands")
        .unwrap();

    let query = engine.parse("otters hands").unwrap();
    assert_eq!(engine.search(&reader, &query, 10).total_hits, 0);

    assert!(reader.refresh_if_changed().unwrap());
    let top = engine.search(&reader, &query, 10);
    assert_eq!(top.hits.len(), 1);
    assert_eq!(top.hits[0].doc_id, id);

    let fragment = highlighter.fragment(&reader, id, &query);
    assert!(fragment.contains("<span class=\"term\">otters</span>"));
    assert!(fragment.contains("<span class=\"term\">hands</span>"));
}

#[test]
fn test_missing_index_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&tmp.path().join("never-created"), 10);
    let search = SearchOrchestrator::new(&config, &OsPathResolver::default());

    let err = search.search("anything", 0).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Storage);
    assert!(!tmp.path().join("never-created").exists());
}
