//! Filesystem partition store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{ProxyResponse, RequestKey, StoredResponse};
use crate::domain::ports::PartitionStore;

const META_EXTENSION: &str = "json";
const BODY_EXTENSION: &str = "body";

/// Filesystem implementation of PartitionStore
///
/// Layout under the root directory:
///
/// ```text
/// <root>/<partition>/<entry-id>.json   method, url, status, headers, stored_at
/// <root>/<partition>/<entry-id>.body   raw response body
/// ```
///
/// Entry ids are name-based UUIDs of `"<METHOD> <url>"`, so the same request
/// always maps to the same files and a later put overwrites an earlier one.
#[derive(Debug, Clone)]
pub struct FsPartitionStore {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    method: String,
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

impl FsPartitionStore {
    /// Store rooted at `root`; nothing is created until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, partition: &str) -> StoreResult<PathBuf> {
        let valid = !partition.is_empty()
            && partition != "."
            && partition != ".."
            && !partition.contains(['/', '\\']);
        if !valid {
            return Err(StoreError::InvalidName(partition.to_string()));
        }
        Ok(self.root.join(partition))
    }

    fn entry_id(key: &RequestKey) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, key.to_string().as_bytes())
    }

    fn entry_paths(dir: &Path, key: &RequestKey) -> (PathBuf, PathBuf) {
        let id = Self::entry_id(key).to_string();
        (
            dir.join(format!("{id}.{META_EXTENSION}")),
            dir.join(format!("{id}.{BODY_EXTENSION}")),
        )
    }

    async fn read_meta(path: &Path) -> StoreResult<Option<EntryMeta>> {
        match fs::read(path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl PartitionStore for FsPartitionStore {
    async fn partition_names(&self) -> StoreResult<Vec<String>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn open(&self, partition: &str) -> StoreResult<()> {
        fs::create_dir_all(self.partition_dir(partition)?).await?;
        Ok(())
    }

    async fn put(&self, partition: &str, entry: StoredResponse) -> StoreResult<()> {
        let dir = self.partition_dir(partition)?;
        fs::create_dir_all(&dir).await?;

        let (meta_path, body_path) = Self::entry_paths(&dir, &entry.key);
        let meta = EntryMeta {
            method: entry.key.method,
            url: entry.key.url,
            status: entry.response.status,
            headers: entry.response.headers,
            stored_at: entry.stored_at,
        };

        // Body first: a readable meta file implies a complete entry.
        fs::write(&body_path, &entry.response.body).await?;
        fs::write(&meta_path, serde_json::to_vec(&meta)?).await?;

        debug!(partition, url = %meta.url, "response written to disk");
        Ok(())
    }

    async fn lookup(&self, partition: &str, key: &RequestKey) -> StoreResult<Option<StoredResponse>> {
        let dir = self.partition_dir(partition)?;
        let (meta_path, body_path) = Self::entry_paths(&dir, key);

        let Some(meta) = Self::read_meta(&meta_path).await? else {
            return Ok(None);
        };
        if meta.method != key.method || meta.url != key.url {
            return Ok(None);
        }

        let body = match fs::read(&body_path).await {
            Ok(body) => Bytes::from(body),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(StoredResponse {
            key: RequestKey::new(meta.method, meta.url),
            response: ProxyResponse {
                status: meta.status,
                headers: meta.headers,
                body,
            },
            stored_at: meta.stored_at,
        }))
    }

    async fn delete(&self, partition: &str) -> StoreResult<bool> {
        match fs::remove_dir_all(self.partition_dir(partition)?).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn keys(&self, partition: &str) -> StoreResult<Vec<RequestKey>> {
        let dir = self.partition_dir(partition)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(META_EXTENSION) {
                continue;
            }
            if let Some(meta) = Self::read_meta(&path).await? {
                keys.push(RequestKey::new(meta.method, meta.url));
            }
        }
        keys.sort();
        Ok(keys)
    }
}
