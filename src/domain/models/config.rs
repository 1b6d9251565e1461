//! Configuration model
//!
//! Every section has serde defaults, so a partial YAML file or a handful of
//! environment variables is enough.

use serde::{Deserialize, Serialize};

/// Main configuration structure for cacheway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// In-memory object cache configuration
    #[serde(default)]
    pub object_cache: ObjectCacheConfig,

    /// Network caching proxy configuration
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Resource preloader configuration
    #[serde(default)]
    pub preload: PreloadConfig,

    /// Visibility trigger configuration
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// Virtualized grid configuration
    #[serde(default)]
    pub grid: GridConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Object cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ObjectCacheConfig {
    /// Maximum number of entries held at once
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// TTL applied when a caller does not pass one
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// TTL for lazily loaded images
    #[serde(default = "default_image_ttl_ms")]
    pub image_ttl_ms: u64,
}

const fn default_max_entries() -> usize {
    50
}

const fn default_ttl_ms() -> u64 {
    300_000
}

const fn default_image_ttl_ms() -> u64 {
    600_000
}

impl Default for ObjectCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            default_ttl_ms: default_ttl_ms(),
            image_ttl_ms: default_image_ttl_ms(),
        }
    }
}

/// Network caching proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProxyConfig {
    /// Current name of the static partition; bump to invalidate old entries
    #[serde(default = "default_static_partition")]
    pub static_partition: String,

    /// Current name of the dynamic partition; bump to invalidate old entries
    #[serde(default = "default_dynamic_partition")]
    pub dynamic_partition: String,

    /// Shell resources pre-cached on install, relative to `origin`
    #[serde(default = "default_shell_manifest")]
    pub shell_manifest: Vec<String>,

    /// Origin whose responses may be cached
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Directory of the filesystem partition store
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Path extensions routed to the static partition
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,
}

fn default_static_partition() -> String {
    "static-cache-v1".to_string()
}

fn default_dynamic_partition() -> String {
    "dynamic-cache-v1".to_string()
}

fn default_shell_manifest() -> Vec<String> {
    ["/", "/index.html", "/src/main.tsx", "/src/index.css"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_store_dir() -> String {
    ".cacheway/partitions".to_string()
}

fn default_static_extensions() -> Vec<String> {
    ["js", "css", "png", "jpg", "jpeg", "webp"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            static_partition: default_static_partition(),
            dynamic_partition: default_dynamic_partition(),
            shell_manifest: default_shell_manifest(),
            origin: default_origin(),
            store_dir: default_store_dir(),
            static_extensions: default_static_extensions(),
        }
    }
}

/// How script and style preloads are considered settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCompletion {
    /// Marked resolved `asset_settle_ms` after the hint is issued
    Optimistic,
    /// Resolved when the underlying load actually completes
    Awaited,
}

/// Resource preloader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PreloadConfig {
    /// Whether script and style loads are awaited
    #[serde(default = "default_asset_completion")]
    pub asset_completion: AssetCompletion,

    /// Delay before an optimistic asset counts as loaded
    #[serde(default = "default_asset_settle_ms")]
    pub asset_settle_ms: u64,
}

const fn default_asset_completion() -> AssetCompletion {
    AssetCompletion::Optimistic
}

const fn default_asset_settle_ms() -> u64 {
    100
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            asset_completion: default_asset_completion(),
            asset_settle_ms: default_asset_settle_ms(),
        }
    }
}

/// Visibility trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ViewportConfig {
    /// Visible fraction that triggers a lazy image
    #[serde(default = "default_lazy_threshold")]
    pub lazy_image_threshold: f64,

    /// Early-trigger margin for lazy images, in pixels
    #[serde(default = "default_lazy_margin")]
    pub lazy_image_margin: f64,

    /// Visible fraction that triggers infinite scroll
    #[serde(default = "default_scroll_threshold")]
    pub infinite_scroll_threshold: f64,

    /// Early-trigger margin for infinite scroll, in pixels
    #[serde(default = "default_scroll_margin")]
    pub infinite_scroll_margin: f64,
}

const fn default_lazy_threshold() -> f64 {
    0.1
}

const fn default_lazy_margin() -> f64 {
    50.0
}

const fn default_scroll_threshold() -> f64 {
    1.0
}

const fn default_scroll_margin() -> f64 {
    100.0
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            lazy_image_threshold: default_lazy_threshold(),
            lazy_image_margin: default_lazy_margin(),
            infinite_scroll_threshold: default_scroll_threshold(),
            infinite_scroll_margin: default_scroll_margin(),
        }
    }
}

/// Virtualized grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GridConfig {
    /// Spacing between rows, in pixels
    #[serde(default = "default_gap")]
    pub gap: f64,

    /// Coalescing interval for scroll updates
    #[serde(default = "default_scroll_interval_ms")]
    pub scroll_interval_ms: u64,

    /// Coalescing interval for resize updates
    #[serde(default = "default_resize_interval_ms")]
    pub resize_interval_ms: u64,
}

const fn default_gap() -> f64 {
    16.0
}

const fn default_scroll_interval_ms() -> u64 {
    16
}

const fn default_resize_interval_ms() -> u64 {
    100
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            gap: default_gap(),
            scroll_interval_ms: default_scroll_interval_ms(),
            resize_interval_ms: default_resize_interval_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Log file rotation: daily, hourly or never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}
