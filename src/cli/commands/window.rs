//! Virtual window computation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, GridLayout, VirtualWindow};
use crate::services::compute_window;

/// Arguments of the window command.
#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Number of items in the collection
    #[arg(short, long)]
    pub total: usize,

    /// Items per row
    #[arg(short, long, default_value = "4")]
    pub columns: usize,

    /// Height of one item in pixels
    #[arg(short, long, default_value = "100")]
    pub extent: f64,

    /// Gap between rows (defaults to the configured grid gap)
    #[arg(short, long)]
    pub gap: Option<f64>,

    /// Height of the scroll container
    #[arg(short, long, default_value = "400")]
    pub viewport: f64,

    /// Current scroll offset
    #[arg(short, long, default_value = "0")]
    pub offset: f64,
}

/// Computed window for the given geometry.
#[derive(Debug, Serialize)]
pub struct WindowOutput {
    /// Grid geometry used
    pub layout: GridLayout,
    /// Resulting window
    pub window: VirtualWindow,
    /// Number of materialized items
    pub rendered: usize,
}

impl CommandOutput for WindowOutput {
    fn to_human(&self) -> String {
        format!(
            "items [{}, {}) of {} columns, {} rendered\n  translate: {}px\n  content height: {}px",
            self.window.start_index,
            self.window.end_index,
            self.layout.columns,
            self.rendered,
            self.window.offset,
            self.window.total_height,
        )
    }
}

/// Compute and print the window for one scroll offset.
pub fn execute(args: &WindowArgs, config: &Config, json_mode: bool) -> Result<()> {
    let layout = GridLayout::new(args.extent, args.columns, args.viewport)
        .with_gap(args.gap.unwrap_or(config.grid.gap));
    let window = compute_window(&layout, args.total, args.offset);

    output(
        &WindowOutput {
            layout,
            window,
            rendered: window.len(),
        },
        json_mode,
    );
    Ok(())
}
