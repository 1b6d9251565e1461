//! CLI command implementations.

pub mod fetch;
pub mod install;
pub mod partitions;
pub mod window;
