//! HTTP-level tests for the sheet loader against a mock server.

use daver::sheet::{HttpSheetFetcher, SheetSource, SheetStore};
use std::sync::Arc;
use std::time::Duration;

fn store_for(server: &mockito::ServerGuard, ttl: Duration, gid: Option<u64>) -> SheetStore {
    let source = SheetSource::from_share_url(&server.url()).unwrap();
    SheetStore::new(
        source,
        Arc::new(HttpSheetFetcher::new().unwrap()),
        ttl,
        gid,
    )
}

#[tokio::test]
async fn export_is_fetched_and_parsed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/export?format=csv")
        .with_status(200)
        .with_body("Region,Crop\nSouth,Cotton\n")
        .create_async()
        .await;

    let store = store_for(&server, Duration::from_secs(600), None);
    let table = store.table().await.unwrap();

    assert_eq!(table.columns(), &["Region", "Crop"]);
    assert_eq!(table.row_count(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn fresh_cache_serves_without_a_second_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/export?format=csv")
        .with_status(200)
        .with_body("A\n1\n")
        .expect(1)
        .create_async()
        .await;

    let store = store_for(&server, Duration::from_secs(600), None);
    store.table().await.unwrap();
    store.table().await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn http_failure_is_surfaced_with_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/export?format=csv")
        .with_status(403)
        .create_async()
        .await;

    let store = store_for(&server, Duration::from_secs(600), None);
    let err = store.table().await.unwrap_err();
    assert!(err.to_string().contains("403"), "error was: {}", err);
}

#[tokio::test]
async fn timestamp_tab_is_read_from_its_gid() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/export?format=csv&gid=1733")
        .with_status(200)
        .with_body("2025-11-03 09:30:00\n")
        .create_async()
        .await;

    let store = store_for(&server, Duration::from_secs(600), Some(1733));
    let ts = store.last_updated().await.unwrap().unwrap();
    assert_eq!(ts.raw, "2025-11-03 09:30:00");
    assert!(ts.parsed.is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn no_timestamp_gid_means_no_extra_fetch() {
    let mut server = mockito::Server::new_async().await;
    let store = store_for(&server, Duration::from_secs(600), None);
    assert!(store.last_updated().await.unwrap().is_none());
}
