//! Developer command-line interface
//!
//! Wires the infrastructure adapters to the services. The library core does
//! not depend on anything in this module.

pub mod commands;
pub mod output;
mod types;

pub use types::{Cli, Commands};

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::http::ReqwestFetcher;
use crate::infrastructure::storage::FsPartitionStore;
use crate::services::CachingProxy;

/// Load configuration from an explicit file or the project defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Build a proxy over the filesystem partition store and the real network.
pub fn build_proxy(config: &Config) -> Result<CachingProxy> {
    let store = Arc::new(FsPartitionStore::new(&config.proxy.store_dir));
    let fetcher = Arc::new(ReqwestFetcher::new()?);
    Ok(CachingProxy::from_config(&config.proxy, store, fetcher)?)
}

/// Print an error in the requested format and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
    std::process::exit(1);
}
