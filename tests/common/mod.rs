//! Common test utilities for integration tests
//!
//! Provides scripted network and loader doubles shared across the
//! integration test files.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use cacheway::domain::errors::{FetchError, FetchResult, LoadResult};
use cacheway::domain::models::{ProxyRequest, ProxyResponse, ResourceKind};
use cacheway::domain::ports::{NetworkFetcher, ResourceLoader};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// NetworkFetcher serving canned responses by URL
///
/// Unknown URLs answer 404. `go_offline` makes every fetch fail with a
/// transport error.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, ProxyResponse>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, response: ProxyResponse) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &ProxyRequest) -> FetchResult<ProxyResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::transport(request.url.as_str(), "network unreachable"));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| ProxyResponse::new(404, "not found")))
    }
}

/// ResourceLoader that records every call and fails URLs containing "broken"
#[derive(Default)]
pub struct RecordingLoader {
    pub images: Mutex<Vec<String>>,
    pub assets: Mutex<Vec<(String, ResourceKind)>>,
}

#[async_trait]
impl ResourceLoader for RecordingLoader {
    async fn load_image(&self, url: &str) -> LoadResult<Bytes> {
        self.images.lock().unwrap().push(url.to_string());
        if url.contains("broken") {
            return Err(FetchError::transport(url, "connection reset").into());
        }
        Ok(Bytes::from(format!("image:{url}")))
    }

    async fn load_asset(&self, url: &str, kind: ResourceKind) -> LoadResult<()> {
        self.assets.lock().unwrap().push((url.to_string(), kind));
        if url.contains("broken") {
            return Err(FetchError::transport(url, "connection reset").into());
        }
        Ok(())
    }
}
