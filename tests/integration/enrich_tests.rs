//! Integration tests for the enrichment pipeline
//!
//! These tests use wiremock to serve pages and run full enrichment cycles
//! against a SQLite database on disk. Backoff is zero so retries run at once.

use shiori::config::FetcherConfig;
use shiori::enrich::{self, Executor, HttpFetcher, RetryPolicy, RetryScheduler};
use shiori::storage::{SqliteStorage, StatusStore};
use shiori::{AttemptState, BookmarkStatus};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Opens a fresh database inside a temporary directory
fn create_test_storage() -> (TempDir, Arc<SqliteStorage>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = SqliteStorage::new(&dir.path().join("shiori.db"))
        .expect("Failed to open database");
    (dir, Arc::new(storage))
}

/// Builds a scheduler that retries immediately
fn create_scheduler(storage: Arc<SqliteStorage>, max_attempts: u32) -> RetryScheduler {
    create_scheduler_with_timeout(storage, max_attempts, Duration::from_secs(5))
}

fn create_scheduler_with_timeout(
    storage: Arc<SqliteStorage>,
    max_attempts: u32,
    timeout: Duration,
) -> RetryScheduler {
    let config = FetcherConfig {
        timeout_secs: timeout.as_secs(),
        user_agent: "shiori-test/1.0".to_string(),
    };
    let fetcher = if timeout < Duration::from_secs(1) {
        HttpFetcher::with_timeout(timeout).expect("Failed to build client")
    } else {
        HttpFetcher::new(&config).expect("Failed to build client")
    };

    RetryScheduler::new(
        Executor::new(Arc::new(fetcher)),
        storage,
        RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        },
    )
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_title_and_description_are_stored() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<!DOCTYPE html>
            <html>
            <head>
                <title>Example Website</title>
                <meta name="description" content="This is an example website for testing">
            </head>
            <body><h1>Example Website</h1></body>
            </html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (_dir, storage) = create_test_storage();
    let bookmark = storage.create(&format!("{}/", mock_server.uri())).unwrap();
    assert!(bookmark.is_pending());

    let scheduler = create_scheduler(storage.clone(), 3);
    let state = scheduler.run(bookmark.id, &bookmark.url).await.unwrap();
    assert_eq!(state, AttemptState::Succeeded);

    let loaded = storage.get(bookmark.id).unwrap();
    assert!(loaded.is_completed());
    assert_eq!(loaded.title.as_deref(), Some("Example Website"));
    assert_eq!(
        loaded.description.as_deref(),
        Some("This is an example website for testing")
    );
    assert!(!loaded.failed);
    assert_eq!(loaded.last_error, None);
    assert!(loaded.enriched_at.is_some());
}

#[tokio::test]
async fn test_open_graph_tags_take_precedence() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(html_page(
            r#"<html><head>
                <title>Regular Title</title>
                <meta property="og:title" content="OG Title">
                <meta property="og:description" content="OG Description">
                <meta name="description" content="Regular Description">
            </head></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let (_dir, storage) = create_test_storage();
    let bookmark = storage
        .create(&format!("{}/article", mock_server.uri()))
        .unwrap();

    create_scheduler(storage.clone(), 3)
        .run(bookmark.id, &bookmark.url)
        .await
        .unwrap();

    let loaded = storage.get(bookmark.id).unwrap();
    assert_eq!(loaded.title.as_deref(), Some("OG Title"));
    assert_eq!(loaded.description.as_deref(), Some("OG Description"));
}

#[tokio::test]
async fn test_not_found_is_retried_then_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let (_dir, storage) = create_test_storage();
    let bookmark = storage
        .create(&format!("{}/missing", mock_server.uri()))
        .unwrap();

    let state = create_scheduler(storage.clone(), 3)
        .run(bookmark.id, &bookmark.url)
        .await
        .unwrap();
    assert_eq!(state, AttemptState::ExhaustedFailure);

    let loaded = storage.get(bookmark.id).unwrap();
    assert!(loaded.is_failed());
    assert_eq!(loaded.title, None);
    assert_eq!(loaded.enriched_at, None);
    assert_eq!(
        loaded.last_error.as_deref(),
        Some("Error fetching metadata: Failed to fetch URL: HTTP status 404")
    );
}

#[tokio::test]
async fn test_transient_error_then_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html_page("<title>Recovered</title>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (_dir, storage) = create_test_storage();
    let bookmark = storage
        .create(&format!("{}/flaky", mock_server.uri()))
        .unwrap();

    let state = create_scheduler(storage.clone(), 3)
        .run(bookmark.id, &bookmark.url)
        .await
        .unwrap();
    assert_eq!(state, AttemptState::Succeeded);

    let loaded = storage.get(bookmark.id).unwrap();
    assert!(loaded.is_completed());
    assert!(!loaded.failed);
    assert_eq!(loaded.last_error, None);
    assert_eq!(loaded.title.as_deref(), Some("Recovered"));
}

#[tokio::test]
async fn test_page_without_metadata_still_completes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("<html><body><p>No head here</p></body></html>"))
        .mount(&mock_server)
        .await;

    let (_dir, storage) = create_test_storage();
    let bookmark = storage.create(&mock_server.uri()).unwrap();

    create_scheduler(storage.clone(), 3)
        .run(bookmark.id, &bookmark.url)
        .await
        .unwrap();

    let loaded = storage.get(bookmark.id).unwrap();
    assert!(loaded.is_completed());
    assert_eq!(loaded.title, None);
    assert_eq!(loaded.description, None);
    assert!(loaded.enriched_at.is_some());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("<title>Too Late</title>").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let (_dir, storage) = create_test_storage();
    let bookmark = storage.create(&mock_server.uri()).unwrap();

    let state =
        create_scheduler_with_timeout(storage.clone(), 1, Duration::from_millis(200))
            .run(bookmark.id, &bookmark.url)
            .await
            .unwrap();
    assert_eq!(state, AttemptState::ExhaustedFailure);

    let loaded = storage.get(bookmark.id).unwrap();
    assert!(loaded.is_failed());
    let last_error = loaded.last_error.unwrap();
    assert!(
        last_error.starts_with("Error fetching metadata: Request timed out"),
        "unexpected error: {}",
        last_error
    );
}

#[tokio::test]
async fn test_retry_after_failure_runs_fresh_cycle() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/later"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/later"))
        .respond_with(html_page("<title>Back Online</title>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (_dir, storage) = create_test_storage();
    let bookmark = storage
        .create(&format!("{}/later", mock_server.uri()))
        .unwrap();
    let scheduler = create_scheduler(storage.clone(), 3);

    scheduler.run(bookmark.id, &bookmark.url).await.unwrap();
    assert!(storage.get(bookmark.id).unwrap().is_failed());

    let reset = storage.reset_for_retry(bookmark.id).unwrap();
    assert!(reset.is_pending());
    assert_eq!(reset.last_error, None);

    let state = scheduler.run(bookmark.id, &bookmark.url).await.unwrap();
    assert_eq!(state, AttemptState::Succeeded);

    let loaded = storage.get(bookmark.id).unwrap();
    assert!(loaded.is_completed());
    assert_eq!(loaded.title.as_deref(), Some("Back Online"));
}

#[tokio::test]
async fn test_queue_enriches_many_bookmarks() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(html_page("<title>Fine</title>"))
        .mount(&mock_server)
        .await;

    let (_dir, storage) = create_test_storage();
    let (queue, worker) = enrich::start(create_scheduler(storage.clone(), 3));

    let urls = ["/a", "/b", "/broken", "/c"];
    let mut ids = Vec::new();
    for suffix in urls {
        let bookmark = storage
            .create(&format!("{}{}", mock_server.uri(), suffix))
            .unwrap();
        queue.enqueue(bookmark.id, &bookmark.url).unwrap();
        ids.push(bookmark.id);
    }

    let stats = worker.wait().await.unwrap();
    assert_eq!(stats.dispatched, 4);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.exhausted, 1);

    assert_eq!(storage.list(Some(BookmarkStatus::Completed)).unwrap().len(), 3);
    let failed = storage.list(Some(BookmarkStatus::Failed)).unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, ids[2]);
    assert!(storage.list(Some(BookmarkStatus::Pending)).unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_bookmarks_survive_restart() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("<title>Resumed</title>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shiori.db");

    // Bookmarks created by a run that never got to enrich them
    {
        let storage = SqliteStorage::new(&db_path).unwrap();
        storage.create(&format!("{}/one", mock_server.uri())).unwrap();
        storage.create(&format!("{}/two", mock_server.uri())).unwrap();
    }

    let storage = Arc::new(SqliteStorage::new(Path::new(&db_path)).unwrap());
    let pending = storage.list(Some(BookmarkStatus::Pending)).unwrap();
    assert_eq!(pending.len(), 2);

    let (queue, worker) = enrich::start(create_scheduler(storage.clone(), 3));
    for bookmark in &pending {
        queue.enqueue(bookmark.id, &bookmark.url).unwrap();
    }
    worker.wait().await.unwrap();

    let completed = storage.list(Some(BookmarkStatus::Completed)).unwrap();
    assert_eq!(completed.len(), 2);
    assert!(completed
        .iter()
        .all(|b| b.title.as_deref() == Some("Resumed")));
}
