//! Resource preloading
//!
//! [`ResourcePreloader`] issues every load of a batch concurrently, high
//! priority first, and reports `is_loading = false` once all of them have
//! settled. Failures are collected, never propagated.
//!
//! [`CriticalPathLoader`] loads every listed image to completion and then
//! signals readiness. A failed image is only logged and never cuts its
//! siblings short.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::LoadResult;
use crate::domain::models::{
    AssetCompletion, PreloadConfig, PreloadReport, PreloadResource, ResourceKind,
};
use crate::domain::ports::ResourceLoader;

/// Issue order: all `High` before all `Low`, input order otherwise.
pub fn execution_order(resources: &[PreloadResource]) -> Vec<PreloadResource> {
    let mut ordered = resources.to_vec();
    // sort_by_key is stable
    ordered.sort_by_key(|resource| resource.priority);
    ordered
}

/// Observable progress of a preload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadStatus {
    /// URLs that loaded successfully so far
    pub loaded: HashSet<String>,
    /// `false` once every load of the batch has settled
    pub is_loading: bool,
}

/// A running preload batch.
pub struct PreloadHandle {
    status: watch::Receiver<PreloadStatus>,
    task: JoinHandle<PreloadReport>,
}

impl PreloadHandle {
    /// Snapshot of the current progress.
    pub fn status(&self) -> PreloadStatus {
        self.status.borrow().clone()
    }

    /// Whether any load of the batch is still pending.
    pub fn is_loading(&self) -> bool {
        self.status.borrow().is_loading
    }

    /// Whether `url` has loaded successfully.
    pub fn is_loaded(&self, url: &str) -> bool {
        self.status.borrow().loaded.contains(url)
    }

    /// Wait for every load in the batch to settle.
    pub async fn wait(self) -> PreloadReport {
        match self.task.await {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "preload batch task did not complete");
                let status = self.status.borrow().clone();
                PreloadReport {
                    loaded: status.loaded.into_iter().collect(),
                    failed: Vec::new(),
                }
            }
        }
    }
}

/// Loads a batch of resources concurrently in priority order.
#[derive(Clone)]
pub struct ResourcePreloader {
    loader: Arc<dyn ResourceLoader>,
    config: PreloadConfig,
}

impl ResourcePreloader {
    /// Create a preloader with the default completion policy.
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self::with_config(loader, PreloadConfig::default())
    }

    /// Create a preloader with an explicit completion policy.
    pub fn with_config(loader: Arc<dyn ResourceLoader>, config: PreloadConfig) -> Self {
        Self { loader, config }
    }

    /// Start a batch in the background. Must be called inside a tokio runtime.
    pub fn start(&self, resources: &[PreloadResource]) -> PreloadHandle {
        let ordered = execution_order(resources);
        let (sender, status) = watch::channel(PreloadStatus {
            loaded: HashSet::new(),
            is_loading: !ordered.is_empty(),
        });

        let loader = Arc::clone(&self.loader);
        let config = self.config.clone();
        let task = tokio::spawn(run_batch(loader, config, ordered, sender));

        PreloadHandle { status, task }
    }

    /// Run a batch to completion.
    pub async fn preload(&self, resources: &[PreloadResource]) -> PreloadReport {
        self.start(resources).wait().await
    }
}

async fn run_batch(
    loader: Arc<dyn ResourceLoader>,
    config: PreloadConfig,
    ordered: Vec<PreloadResource>,
    status: watch::Sender<PreloadStatus>,
) -> PreloadReport {
    let mut report = PreloadReport::default();
    if ordered.is_empty() {
        return report;
    }

    debug!(count = ordered.len(), "issuing preload batch");

    // Futures are created and first polled in issue order.
    let mut loads: FuturesUnordered<_> = ordered
        .into_iter()
        .map(|resource| {
            let loader = Arc::clone(&loader);
            let config = &config;
            async move {
                let result = load_one(loader, config, &resource).await;
                (resource, result)
            }
        })
        .collect();

    while let Some((resource, result)) = loads.next().await {
        match result {
            Ok(()) => {
                status.send_modify(|status| {
                    status.loaded.insert(resource.url.clone());
                });
                report.loaded.push(resource.url);
            }
            Err(err) => {
                warn!(url = %resource.url, kind = resource.kind.as_str(), error = %err, "preload failed");
                report.failed.push((resource.url, err.to_string()));
            }
        }
    }

    status.send_modify(|status| status.is_loading = false);
    info!(
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        "preload batch settled"
    );
    report
}

async fn load_one(
    loader: Arc<dyn ResourceLoader>,
    config: &PreloadConfig,
    resource: &PreloadResource,
) -> LoadResult<()> {
    match resource.kind {
        ResourceKind::Image => loader.load_image(&resource.url).await.map(|_| ()),
        kind => match config.asset_completion {
            AssetCompletion::Awaited => loader.load_asset(&resource.url, kind).await,
            AssetCompletion::Optimistic => {
                // The hint keeps running after the optimistic resolve; its outcome is only logged.
                let url = resource.url.clone();
                tokio::spawn(async move {
                    if let Err(err) = loader.load_asset(&url, kind).await {
                        debug!(url = %url, error = %err, "preload hint failed after optimistic resolve");
                    }
                });
                tokio::time::sleep(Duration::from_millis(config.asset_settle_ms)).await;
                Ok(())
            }
        },
    }
}

/// Gates readiness on a fixed set of critical images.
pub struct CriticalPathLoader {
    loader: Arc<dyn ResourceLoader>,
}

impl CriticalPathLoader {
    /// Create a critical path loader over `loader`.
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self { loader }
    }

    /// Start loading `images`; the returned receiver flips to `true` once
    /// every one of them has settled, successfully or not.
    pub fn start(&self, images: Vec<String>) -> watch::Receiver<bool> {
        let (ready, receiver) = watch::channel(images.is_empty());
        if images.is_empty() {
            return receiver;
        }

        let loader = Arc::clone(&self.loader);
        tokio::spawn(async move {
            load_critical(loader.as_ref(), &images).await;
            ready.send_replace(true);
        });
        receiver
    }

    /// Load the critical set and return once the page may be considered ready.
    pub async fn load(&self, images: &[String]) {
        load_critical(self.loader.as_ref(), images).await;
    }
}

async fn load_critical(loader: &dyn ResourceLoader, images: &[String]) {
    if images.is_empty() {
        return;
    }

    let results = join_all(images.iter().map(|url| loader.load_image(url))).await;

    let mut failed = 0usize;
    for (url, result) in images.iter().zip(results) {
        if let Err(err) = result {
            failed += 1;
            warn!(url = %url, error = %err, "critical path image failed, continuing");
        }
    }
    info!(count = images.len(), failed, "critical path ready");
}
