//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces external collaborators must implement:
//! - NetworkFetcher: byte-stream fetch keyed by method and URL
//! - PartitionStore: named persistent partitions of cached responses
//! - ResourceLoader: image decoding and script/style loading
//! - VisibilityObserver: viewport intersection notifications
//!
//! These traits keep the core services independent of any specific HTTP
//! client, storage backend or rendering platform.

pub mod network_fetcher;
pub mod partition_store;
pub mod resource_loader;
pub mod visibility_observer;

pub use network_fetcher::NetworkFetcher;
pub use partition_store::PartitionStore;
pub use resource_loader::ResourceLoader;
pub use visibility_observer::{Subscription, VisibilityObserver};
