//! Infrastructure layer module
//!
//! Adapters that satisfy the port traits defined in the domain layer, plus
//! the ambient concerns around them:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - HTTP fetching and resource loading (reqwest)
//! - Partition stores (memory and filesystem)
//! - Viewport geometry for visibility observation

pub mod config;
pub mod http;
pub mod logging;
pub mod storage;
pub mod viewport;
