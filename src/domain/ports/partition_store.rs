//! Partition store port.

use crate::domain::errors::StoreResult;
use crate::domain::models::{RequestKey, StoredResponse};
use async_trait::async_trait;

/// Port for the persistent key-to-response store, organized as named partitions
///
/// Partitions survive page reloads. They are not expected to survive proxy
/// version upgrades: migration happens by renaming partitions and deleting
/// the old names.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Names of all existing partitions
    async fn partition_names(&self) -> StoreResult<Vec<String>>;

    /// Create the partition if it does not exist yet
    async fn open(&self, partition: &str) -> StoreResult<()>;

    /// Store a response, replacing any previous one for the same key
    ///
    /// Creates the partition when needed.
    async fn put(&self, partition: &str, entry: StoredResponse) -> StoreResult<()>;

    /// Look up an exact key in one partition
    async fn lookup(&self, partition: &str, key: &RequestKey) -> StoreResult<Option<StoredResponse>>;

    /// Delete a partition and everything in it
    ///
    /// Returns `false` when the partition did not exist.
    async fn delete(&self, partition: &str) -> StoreResult<bool>;

    /// Keys stored in a partition
    async fn keys(&self, partition: &str) -> StoreResult<Vec<RequestKey>>;
}
