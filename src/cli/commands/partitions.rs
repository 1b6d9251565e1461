//! Partition listing.

use anyhow::Result;
use serde::Serialize;

use crate::cli::build_proxy;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::Config;
use crate::services::PartitionSummary;

/// Partition listing.
#[derive(Debug, Serialize)]
pub struct PartitionListOutput {
    /// One row per partition
    pub partitions: Vec<PartitionSummary>,
    /// Total stored responses
    pub total: usize,
}

impl CommandOutput for PartitionListOutput {
    fn to_human(&self) -> String {
        if self.partitions.is_empty() {
            return "No partitions found.".to_string();
        }

        let mut table = list_table(&["name", "entries", "current"]);
        for partition in &self.partitions {
            table.add_row(vec![
                partition.name.clone(),
                partition.entries.to_string(),
                if partition.current { "yes" } else { "stale" }.to_string(),
            ]);
        }
        format!("{} partition(s):\n{table}", self.total)
    }
}

/// List partitions and their entry counts.
pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let proxy = build_proxy(config)?;
    let partitions = proxy.partitions().await?;

    output(
        &PartitionListOutput {
            total: partitions.len(),
            partitions,
        },
        json_mode,
    );
    Ok(())
}
