//! FsPartitionStore behavior on a real directory tree.

mod common;

use cacheway::domain::models::{ProxyResponse, RequestKey, StoredResponse};
use cacheway::domain::ports::PartitionStore;
use cacheway::infrastructure::storage::FsPartitionStore;
use cacheway::StoreError;
use common::temp_dir;
use tokio_test::{assert_err, assert_ok};

fn entry(url: &str, body: &'static str) -> StoredResponse {
    StoredResponse::new(
        RequestKey::get(url),
        ProxyResponse::new(200, body).with_header("content-type", "text/plain"),
    )
}

#[tokio::test]
async fn test_put_then_lookup_round_trips_response() {
    let dir = temp_dir();
    let store = FsPartitionStore::new(dir.path());

    assert_ok!(store.put("static-cache-v1", entry("http://localhost/a.js", "a()")).await);

    let found = store
        .lookup("static-cache-v1", &RequestKey::get("http://localhost/a.js"))
        .await
        .unwrap()
        .expect("entry should be present");
    assert_eq!(found.response.status, 200);
    assert_eq!(found.response.body.as_ref(), b"a()");
    assert_eq!(found.response.content_type(), Some("text/plain"));
}

#[tokio::test]
async fn test_entries_persist_across_store_instances() {
    let dir = temp_dir();
    FsPartitionStore::new(dir.path())
        .put("dynamic-cache-v1", entry("http://localhost/api", "[]"))
        .await
        .unwrap();

    let reopened = FsPartitionStore::new(dir.path());
    let keys = reopened.keys("dynamic-cache-v1").await.unwrap();
    assert_eq!(keys, vec![RequestKey::get("http://localhost/api")]);
}

#[tokio::test]
async fn test_put_overwrites_same_request() {
    let dir = temp_dir();
    let store = FsPartitionStore::new(dir.path());
    store.put("p", entry("http://localhost/x", "old")).await.unwrap();
    store.put("p", entry("http://localhost/x", "new")).await.unwrap();

    assert_eq!(store.keys("p").await.unwrap().len(), 1);
    let found = store
        .lookup("p", &RequestKey::get("http://localhost/x"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.response.body.as_ref(), b"new");
}

#[tokio::test]
async fn test_method_is_part_of_identity() {
    let dir = temp_dir();
    let store = FsPartitionStore::new(dir.path());
    store.put("p", entry("http://localhost/x", "body")).await.unwrap();

    let head = RequestKey::new("HEAD", "http://localhost/x");
    assert!(store.lookup("p", &head).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_partition_behaves_as_empty() {
    let dir = temp_dir();
    let store = FsPartitionStore::new(dir.path().join("never-created"));

    assert!(store.partition_names().await.unwrap().is_empty());
    assert!(store.keys("static-cache-v1").await.unwrap().is_empty());
    assert!(store
        .lookup("static-cache-v1", &RequestKey::get("http://localhost/"))
        .await
        .unwrap()
        .is_none());
    assert!(!store.delete("static-cache-v1").await.unwrap());
}

#[tokio::test]
async fn test_open_list_and_delete_partitions() {
    let dir = temp_dir();
    let store = FsPartitionStore::new(dir.path());

    store.open("static-cache-v2").await.unwrap();
    store.open("dynamic-cache-v2").await.unwrap();
    store.put("static-cache-v1", entry("http://localhost/", "shell")).await.unwrap();

    assert_eq!(
        store.partition_names().await.unwrap(),
        vec!["dynamic-cache-v2", "static-cache-v1", "static-cache-v2"]
    );

    assert!(store.delete("static-cache-v1").await.unwrap());
    assert_eq!(
        store.partition_names().await.unwrap(),
        vec!["dynamic-cache-v2", "static-cache-v2"]
    );
}

#[tokio::test]
async fn test_path_like_partition_names_are_rejected() {
    let dir = temp_dir();
    let store = FsPartitionStore::new(dir.path());

    let result = store.put("../escape", entry("http://localhost/", "x")).await;
    assert!(matches!(assert_err!(result), StoreError::InvalidName(_)));
}
