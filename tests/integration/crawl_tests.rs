//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl-and-index cycle end-to-end against a temporary index directory.

use std::path::Path;
use std::time::Duration;
use sumi_search::config::{
    Config, CrawlConfig, IndexConfig, OsPathResolver, SearchConfig, UserAgentConfig,
};
use sumi_search::index::{DocId, IndexReader};
use sumi_search::IndexOrchestrator;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration storing the index in `index_dir`
fn create_test_config(index_dir: &Path) -> Config {
    Config {
        index: IndexConfig {
            directory: index_dir.display().to_string(),
            directory_windows: None,
            directory_unix: None,
        },
        crawl: CrawlConfig {
            request_timeout_secs: 10,
            grace_period_secs: 1,
            ..CrawlConfig::default()
        },
        search: SearchConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
    }
}

/// An HTML page linking to `links`
fn html_page(title: &str, body: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">link</a>"#, l))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body><p>{}</p>{}</body></html>",
            title, body, anchors
        ),
        "text/html",
    )
}

async fn mount(server: &MockServer, route: &str, template: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

/// Mounts P0 -> {P1, P2}, P1 -> {P3}
async fn mount_scenario(server: &MockServer, p3_fetches: u64) {
    mount(server, "/p0", html_page("P0", "seed page", &["/p1", "/p2"]), 1).await;
    mount(server, "/p1", html_page("P1", "first child", &["/p3", "/p0"]), 1).await;
    mount(server, "/p2", html_page("P2", "second child", &["/p0"]), 1).await;
    mount(server, "/p3", html_page("P3", "grandchild", &[]), p3_fetches).await;
}

fn indexed_paths(index_dir: &Path) -> Vec<String> {
    let reader = IndexReader::open(index_dir).expect("index should exist");
    let mut paths: Vec<String> = (0..reader.doc_count() as DocId)
        .filter_map(|id| reader.document(id).map(|d| d.path.clone()))
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_depth_one_does_not_follow_leaf_links() {
    let mock_server = MockServer::start().await;
    mount_scenario(&mock_server, 0).await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(tmp.path());
    let orchestrator = IndexOrchestrator::new(&config, &OsPathResolver::default()).unwrap();

    let report = orchestrator
        .index_with(&format!("{}/p0", mock_server.uri()), 1, 4)
        .await
        .expect("crawl should succeed");

    assert_eq!(report.documents, 3);
    assert_eq!(report.summary.pages_failed, 0);
    assert_eq!(
        indexed_paths(tmp.path()),
        vec![
            format!("{}/p0", mock_server.uri()),
            format!("{}/p1", mock_server.uri()),
            format!("{}/p2", mock_server.uri()),
        ]
    );

    mock_server.verify().await;
}

#[tokio::test]
async fn test_depth_two_reaches_grandchild() {
    let mock_server = MockServer::start().await;
    mount_scenario(&mock_server, 1).await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(tmp.path());
    let orchestrator = IndexOrchestrator::new(&config, &OsPathResolver::default()).unwrap();

    let report = orchestrator
        .index_with(&format!("{}/p0", mock_server.uri()), 2, 4)
        .await
        .unwrap();

    assert_eq!(report.documents, 4);
    assert_eq!(indexed_paths(tmp.path()).len(), 4);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "/",
        html_page("Home", "home", &["/ok", "/broken", "/image", "/missing"]),
        1,
    )
    .await;
    mount(&mock_server, "/ok", html_page("Ok", "fine", &[]), 1).await;
    mount(&mock_server, "/broken", ResponseTemplate::new(500), 1).await;
    mount(
        &mock_server,
        "/image",
        ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "image/png"),
        1,
    )
    .await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(tmp.path());
    let orchestrator = IndexOrchestrator::new(&config, &OsPathResolver::default()).unwrap();

    let report = orchestrator
        .index_with(&format!("{}/", mock_server.uri()), 3, 2)
        .await
        .unwrap();

    assert_eq!(report.documents, 2);
    assert_eq!(report.summary.pages_failed, 3);
    assert!(!report.summary.cancelled);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_each_page_fetched_once_with_many_workers() {
    let mock_server = MockServer::start().await;
    let routes: Vec<String> = (0..12).map(|i| format!("/n{}", i)).collect();
    let all: Vec<&str> = routes.iter().map(String::as_str).collect();

    for route in &routes {
        let template = html_page(route, "densely linked", &all)
            .set_delay(Duration::from_millis(20));
        mount(&mock_server, route, template, 1).await;
    }

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(tmp.path());
    let orchestrator = IndexOrchestrator::new(&config, &OsPathResolver::default()).unwrap();

    let report = orchestrator
        .index_with(&format!("{}/n0", mock_server.uri()), 4, 8)
        .await
        .unwrap();

    assert_eq!(report.documents, 12);

    let mut paths = indexed_paths(tmp.path());
    paths.dedup();
    assert_eq!(paths.len(), 12);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_time_limit_cancels_crawl() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "/start",
        html_page("Start", "fast seed", &["/slow1", "/slow2"]),
        1,
    )
    .await;
    for route in ["/slow1", "/slow2"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html_page("Slow", "slow page", &[]).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;
    }

    let tmp = TempDir::new().unwrap();
    let mut config = create_test_config(tmp.path());
    config.crawl.time_limit_secs = Some(1);
    config.crawl.grace_period_secs = 1;
    let orchestrator = IndexOrchestrator::new(&config, &OsPathResolver::default()).unwrap();

    let started = std::time::Instant::now();
    let report = orchestrator
        .index_with(&format!("{}/start", mock_server.uri()), 1, 2)
        .await
        .unwrap();

    assert!(report.summary.cancelled);
    assert_eq!(report.documents, 1);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(indexed_paths(tmp.path()).len(), 1);
}

#[tokio::test]
async fn test_crawl_local_directory() {
    let docs = TempDir::new().unwrap();
    std::fs::write(docs.path().join("notes.txt"), "plain text about otters").unwrap();
    std::fs::create_dir(docs.path().join("guide")).unwrap();
    std::fs::write(
        docs.path().join("guide").join("intro.html"),
        "<html><head><title>Intro</title></head><body>otters swim</body></html>",
    )
    .unwrap();

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(tmp.path());
    let orchestrator = IndexOrchestrator::new(&config, &OsPathResolver::default()).unwrap();

    let report = orchestrator
        .index_with(docs.path().to_str().unwrap(), 2, 2)
        .await
        .unwrap();

    assert_eq!(report.documents, 2);

    let reader = IndexReader::open(tmp.path()).unwrap();
    let mut titles: Vec<String> = (0..reader.doc_count() as DocId)
        .filter_map(|id| reader.document(id).map(|d| d.title.clone()))
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Intro", "notes.txt"]);
    assert_eq!(reader.doc_freq("otters"), 2);
}

#[tokio::test]
async fn test_unreachable_seed_indexes_nothing() {
    let tmp = TempDir::new().unwrap();
    let config = create_test_config(tmp.path());
    let orchestrator = IndexOrchestrator::new(&config, &OsPathResolver::default()).unwrap();

    // Nothing listens on port 9 of localhost
    let report = orchestrator
        .index_with("http://127.0.0.1:9/", 2, 2)
        .await
        .unwrap();

    assert_eq!(report.documents, 0);
    assert_eq!(report.summary.pages_failed, 1);
}
