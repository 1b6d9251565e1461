//! Cacheway - client-side performance core
//!
//! Decides what to fetch, when, and what to keep in memory or storage:
//!
//! - [`ObjectCache`]: in-memory TTL + LRU store shared by the loaders
//! - [`ViewportTrigger`]: fires a callback when a region approaches the viewport
//! - [`LazyImageLoader`]: loads images on demand through the object cache
//! - [`ResourcePreloader`] and [`CriticalPathLoader`]: priority-ordered batch loading
//! - [`CachingProxy`]: cache-first request interception over static/dynamic partitions
//! - [`VirtualizedGrid`]: renders only the visible window of a large collection
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, port traits and errors
//! - **Service Layer** (`services`): the components above, written against ports
//! - **Infrastructure Layer** (`infrastructure`): reqwest, filesystem and
//!   viewport adapters plus configuration and logging
//! - **CLI Layer** (`cli`): developer command-line interface
//!
//! # Example
//!
//! ```
//! use cacheway::ObjectCache;
//! use std::time::Duration;
//!
//! let cache: ObjectCache<String> = ObjectCache::new(2);
//! cache.set_with_ttl("greeting", "hello".to_string(), Duration::from_secs(60));
//! assert_eq!(cache.get("greeting").as_deref(), Some("hello"));
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{FetchError, LoadError, ProxyError, StoreError};
pub use domain::models::{
    Config, GridLayout, ProxyRequest, ProxyResponse, PreloadResource, RequestDestination,
    VirtualWindow,
};
pub use domain::ports::{NetworkFetcher, PartitionStore, ResourceLoader, VisibilityObserver};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    CachingProxy, CriticalPathLoader, LazyImageLoader, ObjectCache, ResourcePreloader,
    ViewportTrigger, VirtualizedGrid,
};
