//! Network caching proxy
//!
//! Sits between the page and the network with a cache-first policy over two
//! named partitions:
//!
//! - **install**: pre-cache the shell manifest into the static partition
//! - **activate**: delete every partition that is not one of the two current
//!   names, then start intercepting
//! - **intercept**: serve from either partition, otherwise fetch and
//!   opportunistically store same-origin 200 responses in the background
//!
//! Partition writes never block the response and their failures are only
//! logged.

use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::errors::{ProxyError, ProxyResult};
use crate::domain::models::{
    ProxyConfig, ProxyRequest, ProxyResponse, RequestDestination, StoredResponse,
};
use crate::domain::ports::{NetworkFetcher, PartitionStore};

/// Which partition a cacheable response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Scripts, styles and images
    Static,
    /// Everything else
    Dynamic,
}

/// Lifecycle phase of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyPhase {
    /// Created, nothing cached yet
    New,
    /// Shell pre-cached, not yet intercepting
    Installed,
    /// Intercepting requests
    Active,
}

impl fmt::Display for ProxyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Installed => "installed",
            Self::Active => "active",
        };
        f.write_str(name)
    }
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Replayed from the named partition
    Cache(String),
    /// Fetched from the network
    Network,
    /// Synthesized because the network was unreachable
    Fallback,
}

/// Outcome of intercepting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Not handled; the page performs the request itself
    PassThrough,
    /// Answered by the proxy
    Respond {
        /// Response handed back to the page
        response: ProxyResponse,
        /// Where the response came from
        source: ResponseSource,
    },
}

impl Interception {
    /// The response, unless the request was passed through.
    pub fn response(&self) -> Option<&ProxyResponse> {
        match self {
            Self::PassThrough => None,
            Self::Respond { response, .. } => Some(response),
        }
    }

    /// Whether the response was replayed from a partition.
    pub fn is_from_cache(&self) -> bool {
        matches!(
            self,
            Self::Respond {
                source: ResponseSource::Cache(_),
                ..
            }
        )
    }
}

/// Partition listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    /// Partition name
    pub name: String,
    /// Number of stored responses
    pub entries: usize,
    /// Whether this is one of the two partitions in use
    pub current: bool,
}

/// Resolved proxy settings.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Origin whose responses may be stored
    pub origin: Url,
    /// Current static partition name
    pub static_partition: String,
    /// Current dynamic partition name
    pub dynamic_partition: String,
    /// Absolute URLs pre-cached on install
    pub shell_manifest: Vec<Url>,
    /// Extensions classified as static
    pub static_extensions: Vec<String>,
}

impl ProxySettings {
    /// Resolve the manifest against the origin and validate partition names.
    pub fn from_config(config: &ProxyConfig) -> ProxyResult<Self> {
        let origin = Url::parse(&config.origin)
            .map_err(|e| ProxyError::InvalidConfig(format!("origin {}: {e}", config.origin)))?;

        let shell_manifest = config
            .shell_manifest
            .iter()
            .map(|path| {
                origin
                    .join(path)
                    .map_err(|e| ProxyError::InvalidConfig(format!("manifest entry {path}: {e}")))
            })
            .collect::<ProxyResult<Vec<_>>>()?;

        if config.static_partition.is_empty()
            || config.dynamic_partition.is_empty()
            || config.static_partition == config.dynamic_partition
        {
            return Err(ProxyError::InvalidConfig(
                "partition names must be non-empty and distinct".to_string(),
            ));
        }

        Ok(Self {
            origin,
            static_partition: config.static_partition.clone(),
            dynamic_partition: config.dynamic_partition.clone(),
            shell_manifest,
            static_extensions: config.static_extensions.clone(),
        })
    }

    /// Current name of `partition`.
    pub fn partition_name(&self, partition: Partition) -> &str {
        match partition {
            Partition::Static => &self.static_partition,
            Partition::Dynamic => &self.dynamic_partition,
        }
    }

    fn is_current(&self, name: &str) -> bool {
        name == self.static_partition || name == self.dynamic_partition
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }
}

/// Classify a URL by the extension of its last path segment.
///
/// Pure in the URL: repeated calls always agree. Matching is case-sensitive.
pub fn classify(url: &Url, static_extensions: &[String]) -> Partition {
    let last_segment = url.path().rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((_, ext)) if static_extensions.iter().any(|known| known == ext) => Partition::Static,
        _ => Partition::Dynamic,
    }
}

/// Cache-first request interceptor over a partitioned store.
pub struct CachingProxy {
    store: Arc<dyn PartitionStore>,
    fetcher: Arc<dyn NetworkFetcher>,
    settings: ProxySettings,
    phase: RwLock<ProxyPhase>,
    writes: TaskTracker,
}

impl CachingProxy {
    /// Create a proxy in the `New` phase.
    pub fn new(
        store: Arc<dyn PartitionStore>,
        fetcher: Arc<dyn NetworkFetcher>,
        settings: ProxySettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            settings,
            phase: RwLock::new(ProxyPhase::New),
            writes: TaskTracker::new(),
        }
    }

    /// Create a proxy from configuration.
    pub fn from_config(
        config: &ProxyConfig,
        store: Arc<dyn PartitionStore>,
        fetcher: Arc<dyn NetworkFetcher>,
    ) -> ProxyResult<Self> {
        Ok(Self::new(store, fetcher, ProxySettings::from_config(config)?))
    }

    /// Resolved settings.
    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> ProxyPhase {
        *self.phase.read().await
    }

    /// Classify `url` with the configured static extensions.
    pub fn classify(&self, url: &Url) -> Partition {
        classify(url, &self.settings.static_extensions)
    }

    /// Pre-cache the shell manifest into the static partition.
    ///
    /// All-or-nothing: if any manifest entry cannot be fetched with a 200,
    /// nothing is stored and the proxy stays in its previous phase.
    /// Returns the number of pre-cached resources.
    pub async fn install(&self) -> ProxyResult<usize> {
        let static_name = self.settings.static_partition.as_str();
        self.store.open(static_name).await?;
        self.store.open(&self.settings.dynamic_partition).await?;

        let fetches = self.settings.shell_manifest.iter().map(|url| async move {
            let request = ProxyRequest::get(url.clone());
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| ProxyError::Install {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            if !response.is_ok() {
                return Err(ProxyError::Install {
                    url: url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            Ok(StoredResponse::new(request.key(), response))
        });
        let shell = try_join_all(fetches).await?;

        let count = shell.len();
        for entry in shell {
            self.store.put(static_name, entry).await?;
        }

        *self.phase.write().await = ProxyPhase::Installed;
        info!(partition = static_name, count, "shell pre-cached");
        Ok(count)
    }

    /// Install and activate in one step, without waiting for a previous
    /// proxy to release its pages.
    ///
    /// Returns the number of pre-cached resources and the deleted partitions.
    pub async fn install_and_activate(&self) -> ProxyResult<(usize, Vec<String>)> {
        let count = self.install().await?;
        let deleted = self.activate().await?;
        Ok((count, deleted))
    }

    /// Drop stale partitions and start intercepting.
    ///
    /// Returns the names of the deleted partitions.
    pub async fn activate(&self) -> ProxyResult<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.store.partition_names().await? {
            if self.settings.is_current(&name) {
                continue;
            }
            if self.store.delete(&name).await? {
                info!(partition = %name, "deleted stale partition");
                deleted.push(name);
            }
        }

        *self.phase.write().await = ProxyPhase::Active;
        info!(deleted = deleted.len(), "proxy active, claiming open pages");
        Ok(deleted)
    }

    /// Handle one outgoing request.
    ///
    /// Only transport failures for non-image destinations are errors.
    pub async fn intercept(&self, request: &ProxyRequest) -> ProxyResult<Interception> {
        if self.phase().await != ProxyPhase::Active {
            return Ok(Interception::PassThrough);
        }
        if !request.is_get() || !request.is_network_scheme() {
            debug!(method = %request.method, url = %request.url, "passing request through");
            return Ok(Interception::PassThrough);
        }

        if let Some((partition, response)) = self.lookup(request).await {
            debug!(url = %request.url, partition = %partition, "served from cache");
            return Ok(Interception::Respond {
                response,
                source: ResponseSource::Cache(partition),
            });
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() && self.settings.is_same_origin(&request.url) {
                    self.store_in_background(request, response.clone());
                } else {
                    debug!(url = %request.url, status = response.status, "response not cacheable");
                }
                Ok(Interception::Respond {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(err) if request.destination == RequestDestination::Image => {
                debug!(url = %request.url, error = %err, "offline image, serving placeholder");
                Ok(Interception::Respond {
                    response: ProxyResponse::placeholder_image(),
                    source: ResponseSource::Fallback,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn lookup(&self, request: &ProxyRequest) -> Option<(String, ProxyResponse)> {
        let key = request.key();
        for name in [&self.settings.static_partition, &self.settings.dynamic_partition] {
            match self.store.lookup(name, &key).await {
                Ok(Some(stored)) => return Some((name.clone(), stored.response)),
                Ok(None) => {}
                Err(err) => warn!(partition = %name, key = %key, error = %err, "partition lookup failed"),
            }
        }
        None
    }

    fn store_in_background(&self, request: &ProxyRequest, duplicate: ProxyResponse) {
        let partition = self.settings.partition_name(self.classify(&request.url)).to_string();
        let entry = StoredResponse::new(request.key(), duplicate);
        let store = Arc::clone(&self.store);

        self.writes.spawn(async move {
            let key = entry.key.clone();
            match store.put(&partition, entry).await {
                Ok(()) => debug!(partition = %partition, key = %key, "response cached"),
                Err(err) => warn!(partition = %partition, key = %key, error = %err, "cache write failed"),
            }
        });
    }

    /// Wait for every pending background cache write.
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    /// Number of background cache writes still running.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// All partitions in the store with their entry counts.
    pub async fn partitions(&self) -> ProxyResult<Vec<PartitionSummary>> {
        let mut summaries = Vec::new();
        for name in self.store.partition_names().await? {
            let entries = self.store.keys(&name).await?.len();
            summaries.push(PartitionSummary {
                current: self.settings.is_current(&name),
                name,
                entries,
            });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{FetchError, FetchResult, StoreError, StoreResult};
    use crate::domain::models::RequestKey;
    use crate::infrastructure::storage::MemoryPartitionStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubFetcher {
        responses: HashMap<String, ProxyResponse>,
        calls: AtomicUsize,
        offline: AtomicBool,
    }

    impl StubFetcher {
        fn with(mut self, url: &str, response: ProxyResponse) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NetworkFetcher for StubFetcher {
        async fn fetch(&self, request: &ProxyRequest) -> FetchResult<ProxyResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(FetchError::transport(request.url.as_str(), "offline"));
            }
            Ok(self
                .responses
                .get(request.url.as_str())
                .cloned()
                .unwrap_or_else(|| ProxyResponse::new(404, "not found")))
        }
    }

    struct FailingWrites(MemoryPartitionStore);

    #[async_trait]
    impl PartitionStore for FailingWrites {
        async fn partition_names(&self) -> StoreResult<Vec<String>> {
            self.0.partition_names().await
        }
        async fn open(&self, partition: &str) -> StoreResult<()> {
            self.0.open(partition).await
        }
        async fn put(&self, _partition: &str, _entry: StoredResponse) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("quota exceeded")))
        }
        async fn lookup(&self, partition: &str, key: &RequestKey) -> StoreResult<Option<StoredResponse>> {
            self.0.lookup(partition, key).await
        }
        async fn delete(&self, partition: &str) -> StoreResult<bool> {
            self.0.delete(partition).await
        }
        async fn keys(&self, partition: &str) -> StoreResult<Vec<RequestKey>> {
            self.0.keys(partition).await
        }
    }

    fn url(path: &str) -> Url {
        Url::parse("http://localhost:8080").unwrap().join(path).unwrap()
    }

    fn shell_fetcher() -> StubFetcher {
        let mut fetcher = StubFetcher::default();
        for path in ["/", "/index.html", "/src/main.tsx", "/src/index.css"] {
            fetcher = fetcher.with(url(path).as_str(), ProxyResponse::new(200, path.to_string()));
        }
        fetcher
    }

    async fn active_proxy(
        fetcher: Arc<StubFetcher>,
    ) -> (CachingProxy, Arc<MemoryPartitionStore>) {
        let store = Arc::new(MemoryPartitionStore::new());
        let proxy =
            CachingProxy::from_config(&ProxyConfig::default(), store.clone(), fetcher).unwrap();
        proxy.install_and_activate().await.unwrap();
        (proxy, store)
    }

    #[test]
    fn test_classify_by_extension() {
        let exts = ProxyConfig::default().static_extensions;
        assert_eq!(classify(&url("/assets/app.js"), &exts), Partition::Static);
        assert_eq!(classify(&url("/img/photo.webp?w=200"), &exts), Partition::Static);
        assert_eq!(classify(&url("/api/videos"), &exts), Partition::Dynamic);
        assert_eq!(classify(&url("/index.html"), &exts), Partition::Dynamic);
        assert_eq!(classify(&url("/v1.2/list"), &exts), Partition::Dynamic);
        assert_eq!(classify(&url("/LOGO.PNG"), &exts), Partition::Dynamic);
    }

    #[test]
    fn test_settings_reject_same_partition_names() {
        let config = ProxyConfig {
            dynamic_partition: "static-cache-v1".into(),
            ..ProxyConfig::default()
        };
        assert!(matches!(
            ProxySettings::from_config(&config),
            Err(ProxyError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_install_precaches_shell() {
        let fetcher = Arc::new(shell_fetcher());
        let store = Arc::new(MemoryPartitionStore::new());
        let proxy =
            CachingProxy::from_config(&ProxyConfig::default(), store.clone(), fetcher).unwrap();

        assert_eq!(proxy.install().await.unwrap(), 4);
        assert_eq!(proxy.phase().await, ProxyPhase::Installed);
        assert_eq!(store.keys("static-cache-v1").await.unwrap().len(), 4);
        assert!(store.keys("dynamic-cache-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_and_activate_intercepts_immediately() {
        let fetcher = Arc::new(shell_fetcher());
        let store = Arc::new(MemoryPartitionStore::new());
        store.open("static-cache-v0").await.unwrap();
        let proxy =
            CachingProxy::from_config(&ProxyConfig::default(), store.clone(), fetcher).unwrap();

        let (count, deleted) = proxy.install_and_activate().await.unwrap();
        assert_eq!(count, 4);
        assert_eq!(deleted, vec!["static-cache-v0".to_string()]);
        assert_eq!(proxy.phase().await, ProxyPhase::Active);

        let served = proxy
            .intercept(&ProxyRequest::get(url("/index.html")))
            .await
            .unwrap();
        assert!(served.is_from_cache());
    }

    #[tokio::test]
    async fn test_install_fails_when_shell_entry_missing() {
        let fetcher = Arc::new(StubFetcher::default().with(url("/").as_str(), ProxyResponse::new(200, "")));
        let store = Arc::new(MemoryPartitionStore::new());
        let proxy =
            CachingProxy::from_config(&ProxyConfig::default(), store.clone(), fetcher).unwrap();

        let err = proxy.install().await.unwrap_err();
        assert!(matches!(err, ProxyError::Install { .. }));
        assert_eq!(proxy.phase().await, ProxyPhase::New);
        assert!(store.keys("static-cache-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_passes_through_until_active() {
        let fetcher = Arc::new(shell_fetcher());
        let proxy = CachingProxy::from_config(
            &ProxyConfig::default(),
            Arc::new(MemoryPartitionStore::new()),
            fetcher,
        )
        .unwrap();

        let result = proxy.intercept(&ProxyRequest::get(url("/"))).await.unwrap();
        assert_eq!(result, Interception::PassThrough);
    }

    #[tokio::test]
    async fn test_non_get_and_extension_schemes_pass_through() {
        let (proxy, _) = active_proxy(Arc::new(shell_fetcher())).await;

        let post = ProxyRequest::new("POST", url("/api/login"));
        let ext = ProxyRequest::get(Url::parse("chrome-extension://abc/inject.js").unwrap());

        assert_eq!(proxy.intercept(&post).await.unwrap(), Interception::PassThrough);
        assert_eq!(proxy.intercept(&ext).await.unwrap(), Interception::PassThrough);
    }

    #[tokio::test]
    async fn test_cache_first_serving() {
        let fetcher = Arc::new(shell_fetcher().with(url("/app.js").as_str(), ProxyResponse::new(200, "js")));
        let (proxy, store) = active_proxy(fetcher.clone()).await;
        let calls_after_install = fetcher.calls();

        let request = ProxyRequest::get(url("/app.js"));
        let first = proxy.intercept(&request).await.unwrap();
        assert!(!first.is_from_cache());
        proxy.flush().await;

        let second = proxy.intercept(&request).await.unwrap();
        assert_eq!(second.response().unwrap().body, "js");
        assert_eq!(
            second,
            Interception::Respond {
                response: ProxyResponse::new(200, "js"),
                source: ResponseSource::Cache("static-cache-v1".into()),
            }
        );
        assert_eq!(fetcher.calls(), calls_after_install + 1);
        assert_eq!(store.keys("static-cache-v1").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_dynamic_responses_go_to_dynamic_partition() {
        let fetcher = Arc::new(shell_fetcher().with(url("/api/videos").as_str(), ProxyResponse::new(200, "[]")));
        let (proxy, store) = active_proxy(fetcher).await;

        proxy.intercept(&ProxyRequest::get(url("/api/videos"))).await.unwrap();
        proxy.flush().await;

        let keys = store.keys("dynamic-cache-v1").await.unwrap();
        assert_eq!(keys, vec![RequestKey::get(url("/api/videos").as_str())]);
    }

    #[tokio::test]
    async fn test_non_success_and_cross_origin_not_cached() {
        let cross = "https://cdn.example.org/lib.js";
        let fetcher = Arc::new(shell_fetcher().with(cross, ProxyResponse::new(200, "lib")));
        let (proxy, store) = active_proxy(fetcher).await;

        let missing = proxy.intercept(&ProxyRequest::get(url("/missing.js"))).await.unwrap();
        assert_eq!(missing.response().unwrap().status, 404);

        let remote = proxy
            .intercept(&ProxyRequest::get(Url::parse(cross).unwrap()))
            .await
            .unwrap();
        assert_eq!(remote.response().unwrap().body, "lib");

        proxy.flush().await;
        assert_eq!(store.keys("static-cache-v1").await.unwrap().len(), 4);
        assert!(store.keys("dynamic-cache-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_image_gets_placeholder() {
        let fetcher = Arc::new(shell_fetcher());
        let (proxy, _) = active_proxy(fetcher.clone()).await;
        fetcher.offline.store(true, Ordering::SeqCst);

        let request = ProxyRequest::get(url("/photos/cat.png")).with_destination(RequestDestination::Image);
        let result = proxy.intercept(&request).await.unwrap();

        let Interception::Respond { response, source } = result else {
            panic!("expected a response");
        };
        assert_eq!(source, ResponseSource::Fallback);
        assert_eq!(response.content_type(), Some("image/svg+xml"));
    }

    #[tokio::test]
    async fn test_offline_document_surfaces_error() {
        let fetcher = Arc::new(shell_fetcher());
        let (proxy, _) = active_proxy(fetcher.clone()).await;
        fetcher.offline.store(true, Ordering::SeqCst);

        let request = ProxyRequest::get(url("/about")).with_destination(RequestDestination::Document);
        let err = proxy.intercept(&request).await.unwrap_err();
        assert!(matches!(err, ProxyError::Transport(FetchError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let fetcher = Arc::new(shell_fetcher().with(url("/app.css").as_str(), ProxyResponse::new(200, "css")));
        let store = Arc::new(FailingWrites(MemoryPartitionStore::new()));
        let proxy = CachingProxy::from_config(&ProxyConfig::default(), store, fetcher).unwrap();
        *proxy.phase.write().await = ProxyPhase::Active;

        let result = proxy.intercept(&ProxyRequest::get(url("/app.css"))).await.unwrap();
        proxy.flush().await;

        assert_eq!(result.response().unwrap().body, "css");
        assert_eq!(proxy.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_activate_deletes_stale_partitions() {
        let store = Arc::new(MemoryPartitionStore::new());
        store.open("static-cache-v0").await.unwrap();
        store.open("dynamic-cache-v0").await.unwrap();

        let proxy = CachingProxy::from_config(
            &ProxyConfig::default(),
            store.clone(),
            Arc::new(shell_fetcher()),
        )
        .unwrap();
        proxy.install().await.unwrap();
        let mut deleted = proxy.activate().await.unwrap();
        deleted.sort();

        assert_eq!(deleted, vec!["dynamic-cache-v0", "static-cache-v0"]);
        assert_eq!(
            store.partition_names().await.unwrap(),
            vec!["dynamic-cache-v1", "static-cache-v1"]
        );

        let summaries = proxy.partitions().await.unwrap();
        assert!(summaries.iter().all(|summary| summary.current));
    }
}
