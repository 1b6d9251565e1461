//! HTTP adapters
//!
//! - `ReqwestFetcher`: the network fetch port over a pooled reqwest client
//! - `HttpResourceLoader`: resource loading on top of any `NetworkFetcher`

mod fetcher;
mod resource_loader;

pub use fetcher::ReqwestFetcher;
pub use resource_loader::HttpResourceLoader;
