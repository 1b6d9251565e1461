//! Domain layer for the cacheway performance core
//!
//! This module contains the data model, the port traits that external
//! collaborators implement, and the error taxonomy.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{
    FetchError, FetchResult, LoadError, LoadResult, ProxyError, ProxyResult, StoreError,
    StoreResult,
};
