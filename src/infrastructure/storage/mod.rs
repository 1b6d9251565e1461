//! Partition store adapters
//!
//! - `MemoryPartitionStore`: process-local, for tests and ephemeral proxies
//! - `FsPartitionStore`: one directory per partition, survives restarts

mod fs;
mod memory;

pub use fs::FsPartitionStore;
pub use memory::MemoryPartitionStore;
