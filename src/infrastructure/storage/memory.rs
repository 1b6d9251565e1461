//! In-memory partition store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::errors::StoreResult;
use crate::domain::models::{RequestKey, StoredResponse};
use crate::domain::ports::PartitionStore;

type Partition = HashMap<RequestKey, StoredResponse>;

/// In-memory implementation of PartitionStore
///
/// Partitions live as long as the store. Clones of stored responses share
/// their body bytes.
#[derive(Debug, Default)]
pub struct MemoryPartitionStore {
    partitions: RwLock<BTreeMap<String, Partition>>,
}

impl MemoryPartitionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored responses across all partitions.
    pub async fn total_entries(&self) -> usize {
        self.partitions.read().await.values().map(HashMap::len).sum()
    }
}

#[async_trait]
impl PartitionStore for MemoryPartitionStore {
    async fn partition_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.partitions.read().await.keys().cloned().collect())
    }

    async fn open(&self, partition: &str) -> StoreResult<()> {
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default();
        Ok(())
    }

    async fn put(&self, partition: &str, entry: StoredResponse) -> StoreResult<()> {
        debug!(partition, key = %entry.key, "storing response");
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default()
            .insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn lookup(&self, partition: &str, key: &RequestKey) -> StoreResult<Option<StoredResponse>> {
        Ok(self
            .partitions
            .read()
            .await
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn delete(&self, partition: &str) -> StoreResult<bool> {
        Ok(self.partitions.write().await.remove(partition).is_some())
    }

    async fn keys(&self, partition: &str) -> StoreResult<Vec<RequestKey>> {
        let partitions = self.partitions.read().await;
        let mut keys: Vec<_> = partitions
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}
