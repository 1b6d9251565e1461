//! Network fetch port.

use crate::domain::errors::FetchResult;
use crate::domain::models::{ProxyRequest, ProxyResponse};
use async_trait::async_trait;

/// Port for the byte-stream network fetch primitive
///
/// Any response the network produced, including 4xx/5xx, is an `Ok`.
/// `Err` is reserved for transport failures where no response was reachable.
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    /// Perform the request and return status, headers and body
    async fn fetch(&self, request: &ProxyRequest) -> FetchResult<ProxyResponse>;
}
