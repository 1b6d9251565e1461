//! Resource loader over a network fetcher.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::domain::errors::{FetchError, LoadError, LoadResult};
use crate::domain::models::{
    ProxyRequest, ProxyResponse, RequestDestination, ResourceKind, PLACEHOLDER_CONTENT_TYPE,
};
use crate::domain::ports::{NetworkFetcher, ResourceLoader};

/// ResourceLoader that fetches through a NetworkFetcher
///
/// Relative URLs are resolved against the configured base. Images are only
/// considered loaded once they decode; SVG documents are accepted as-is.
pub struct HttpResourceLoader {
    fetcher: Arc<dyn NetworkFetcher>,
    base: Option<Url>,
}

impl HttpResourceLoader {
    /// Loader without a base URL.
    pub fn new(fetcher: Arc<dyn NetworkFetcher>) -> Self {
        Self { fetcher, base: None }
    }

    /// Resolve relative URLs against `base`.
    pub fn with_base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    fn resolve(&self, url: &str) -> LoadResult<Url> {
        let parsed = match &self.base {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        parsed.map_err(|e| {
            LoadError::Fetch(FetchError::InvalidRequest {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })
    }

    async fn fetch_ok(&self, url: &str, destination: RequestDestination) -> LoadResult<ProxyResponse> {
        let request = ProxyRequest::get(self.resolve(url)?).with_destination(destination);
        let response = self.fetcher.fetch(&request).await?;
        if !(200..300).contains(&response.status) {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }
}

fn is_svg(response: &ProxyResponse) -> bool {
    response
        .content_type()
        .is_some_and(|ct| ct.starts_with(PLACEHOLDER_CONTENT_TYPE))
        || response.body.trim_ascii_start().starts_with(b"<svg")
}

#[async_trait]
impl ResourceLoader for HttpResourceLoader {
    async fn load_image(&self, url: &str) -> LoadResult<Bytes> {
        let response = self.fetch_ok(url, RequestDestination::Image).await?;
        if is_svg(&response) {
            return Ok(response.body);
        }

        let body = response.body;
        let decoded = tokio::task::spawn_blocking({
            let body = body.clone();
            move || image::load_from_memory(&body).map(|img| (img.width(), img.height()))
        })
        .await;

        match decoded {
            Ok(Ok((width, height))) => {
                debug!(url, width, height, "image decoded");
                Ok(body)
            }
            Ok(Err(e)) => Err(LoadError::Undecodable {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(e) => Err(LoadError::Undecodable {
                url: url.to_string(),
                reason: format!("decoder task failed: {e}"),
            }),
        }
    }

    async fn load_asset(&self, url: &str, kind: ResourceKind) -> LoadResult<()> {
        let destination = match kind {
            ResourceKind::Image => RequestDestination::Image,
            ResourceKind::Script => RequestDestination::Script,
            ResourceKind::Style => RequestDestination::Style,
        };
        self.fetch_ok(url, destination).await?;
        Ok(())
    }
}
