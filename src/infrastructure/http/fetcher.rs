//! reqwest-backed network fetcher.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use tracing::{debug, instrument};

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::{ProxyRequest, ProxyResponse};
use crate::domain::ports::NetworkFetcher;

/// NetworkFetcher backed by reqwest
///
/// No local timeout is applied; requests take as long as the underlying
/// network stack allows. Every HTTP status, including 4xx/5xx, is returned
/// as a response.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http_client: ReqwestClient,
}

impl ReqwestFetcher {
    /// Create a fetcher with a default pooled client.
    pub fn new() -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http_client })
    }

    /// Wrap an existing client.
    pub fn with_client(http_client: ReqwestClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl NetworkFetcher for ReqwestFetcher {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn fetch(&self, request: &ProxyRequest) -> FetchResult<ProxyResponse> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            FetchError::InvalidRequest {
                url: request.url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let response = self
            .http_client
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(request.url.as_str(), e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(request.url.as_str(), e))?;

        debug!(status, size = body.len(), "fetched");
        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }
}
