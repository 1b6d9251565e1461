//! Resource loading port.

use crate::domain::errors::LoadResult;
use crate::domain::models::ResourceKind;
use async_trait::async_trait;
use bytes::Bytes;

/// Port for making page resources resident
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load an image, resolving once its data is fully decodable
    async fn load_image(&self, url: &str) -> LoadResult<Bytes>;

    /// Load a script or stylesheet
    ///
    /// Preloaders may choose not to await this (see `AssetCompletion`).
    async fn load_asset(&self, url: &str, kind: ResourceKind) -> LoadResult<()>;
}
