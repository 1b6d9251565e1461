//! Virtualized grid geometry.

use serde::{Deserialize, Serialize};

/// Default spacing between grid rows, in pixels.
pub const DEFAULT_GAP: f64 = 16.0;

/// Fixed geometry of a virtualized grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Height of a single item
    pub item_extent: f64,
    /// Spacing between consecutive rows
    pub gap: f64,
    /// Items per row (at least 1)
    pub columns: usize,
    /// Height of the scroll container
    pub viewport_height: f64,
}

impl GridLayout {
    /// Layout with the default gap; `columns` is clamped to at least 1.
    pub fn new(item_extent: f64, columns: usize, viewport_height: f64) -> Self {
        Self {
            item_extent,
            gap: DEFAULT_GAP,
            columns: columns.max(1),
            viewport_height,
        }
    }

    /// Override the gap.
    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    /// Item extent plus gap.
    pub fn row_height(&self) -> f64 {
        self.item_extent + self.gap
    }

    /// Items per row, at least 1.
    pub fn columns(&self) -> usize {
        self.columns.max(1)
    }
}

/// The slice of a collection that is materialized for the current scroll position.
///
/// Derived from the layout, item count and scroll offset; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct VirtualWindow {
    /// First materialized index (inclusive)
    pub start_index: usize,
    /// Last materialized index (exclusive)
    pub end_index: usize,
    /// Translation applied to the rendered subset
    pub offset: f64,
    /// Height of the whole collection, used to size the scroll container
    pub total_height: f64,
}

impl VirtualWindow {
    /// Number of materialized items.
    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    /// Whether nothing is materialized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `index` is materialized.
    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..self.end_index).contains(&index)
    }
}
