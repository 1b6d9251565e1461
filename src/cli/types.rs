//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{fetch::FetchArgs, window::WindowArgs};

/// Top-level command line.
#[derive(Parser)]
#[command(name = "cacheway")]
#[command(about = "Cacheway - client-side caching and rendering core", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .cacheway/config.yaml and .cacheway/local.yaml)
    #[arg(long, global = true, env = "CACHEWAY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Install the caching proxy: pre-cache the shell and drop stale partitions
    Install,

    /// Send one request through the caching proxy
    Fetch(FetchArgs),

    /// List cache partitions and their entry counts
    Partitions,

    /// Compute the virtualized window for a grid
    Window(WindowArgs),
}
