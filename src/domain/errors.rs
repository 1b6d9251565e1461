//! Domain errors for the cacheway performance core.
//!
//! Nothing in this crate is fatal to the surrounding page: every failure path
//! degrades to serving uncached, showing a placeholder, or proceeding without
//! the resource. These types describe what went wrong on the way there.

use thiserror::Error;

/// Failure to obtain any response from the network.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Invalid request URL {url}: {reason}")]
    InvalidRequest { url: String, reason: String },
}

impl FetchError {
    /// Transport failure for `url`.
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result of a network fetch.
pub type FetchResult<T> = Result<T, FetchError>;

/// Failure inside a persistent partition store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Partition store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Partition store serialization error: {0}")]
    Serialization(String),

    #[error("Invalid partition name: {0}")]
    InvalidName(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result of a partition store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// A resource could not be made resident.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Resource at {url} is not decodable: {reason}")]
    Undecodable { url: String, reason: String },
}

/// Result of loading a page resource.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors surfaced by the network caching proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No response could be produced and no fallback applies.
    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error("Failed to pre-cache shell resource {url}: {reason}")]
    Install { url: String, reason: String },

    #[error("Partition store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid proxy configuration: {0}")]
    InvalidConfig(String),
}

/// Result of a proxy operation.
pub type ProxyResult<T> = Result<T, ProxyError>;
