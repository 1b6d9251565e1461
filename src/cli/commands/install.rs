//! Proxy install command.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::build_proxy;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

/// Result of installing the proxy.
#[derive(Debug, Serialize)]
pub struct InstallOutput {
    /// Current static partition
    pub static_partition: String,
    /// Current dynamic partition
    pub dynamic_partition: String,
    /// Number of pre-cached shell resources
    pub precached: usize,
    /// Stale partitions that were deleted
    pub deleted: Vec<String>,
}

impl CommandOutput for InstallOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!(
                "Pre-cached {} shell resource(s) into {}",
                self.precached, self.static_partition
            ),
            format!(
                "Active partitions: {}, {}",
                self.static_partition, self.dynamic_partition
            ),
        ];
        if self.deleted.is_empty() {
            lines.push("No stale partitions.".to_string());
        } else {
            lines.push(format!("Deleted stale partitions: {}", self.deleted.join(", ")));
        }
        lines.join("\n")
    }
}

/// Pre-cache the shell and activate the proxy.
pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let proxy = build_proxy(config)?;
    let (precached, deleted) = proxy
        .install_and_activate()
        .await
        .context("proxy install failed")?;

    output(
        &InstallOutput {
            static_partition: config.proxy.static_partition.clone(),
            dynamic_partition: config.proxy.dynamic_partition.clone(),
            precached,
            deleted,
        },
        json_mode,
    );
    Ok(())
}
