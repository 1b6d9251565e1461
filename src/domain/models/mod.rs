//! Domain models

pub mod cache;
pub mod config;
pub mod preload;
pub mod request;
pub mod viewport;
pub mod window;

pub use cache::{CacheEntry, CacheStats, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
pub use config::{
    AssetCompletion, Config, GridConfig, LoggingConfig, ObjectCacheConfig, PreloadConfig,
    ProxyConfig, ViewportConfig,
};
pub use preload::{PreloadPriority, PreloadReport, PreloadResource, ResourceKind};
pub use request::{
    ProxyRequest, ProxyResponse, RequestDestination, RequestKey, StoredResponse,
    PLACEHOLDER_CONTENT_TYPE, PLACEHOLDER_SVG,
};
pub use viewport::{IntersectionEntry, ObserverOptions, Rect, RegionId};
pub use window::{GridLayout, VirtualWindow, DEFAULT_GAP};
