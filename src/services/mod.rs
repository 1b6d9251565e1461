//! Core services
//!
//! Each service depends only on domain models and port traits, so every
//! collaborator (network, storage, viewport) can be swapped for a test double.

pub mod caching_proxy;
pub mod lazy_loader;
pub mod object_cache;
pub mod preloader;
pub mod viewport_trigger;
pub mod virtualized_grid;

pub use caching_proxy::{
    classify, CachingProxy, Interception, Partition, PartitionSummary, ProxyPhase, ProxySettings,
    ResponseSource,
};
pub use lazy_loader::{
    image_cache_key, ImageState, ImageView, LazyImage, LazyImageLoader, LazyImageOptions, IMAGE_TTL,
};
pub use object_cache::ObjectCache;
pub use preloader::{
    execution_order, CriticalPathLoader, PreloadHandle, PreloadStatus, ResourcePreloader,
};
pub use viewport_trigger::{TriggerConfig, TriggerMode, ViewportTrigger};
pub use virtualized_grid::{
    compute_window, Coalescer, RenderedWindow, Resize, VirtualizedGrid, RESIZE_INTERVAL,
    SCROLL_INTERVAL,
};
