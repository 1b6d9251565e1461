//! Virtualized collection rendering
//!
//! Only the rows intersecting the viewport, plus one overscan row, are
//! materialized. The rendered subset is translated by a single offset so it
//! sits at its true scroll position inside a container sized for the whole
//! collection.
//!
//! Raw scroll and resize events are coalesced independently: scroll at a
//! short interval, resize at a coarser one.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::domain::models::{GridConfig, GridLayout, VirtualWindow};

/// Default coalescing interval for scroll events.
pub const SCROLL_INTERVAL: Duration = Duration::from_millis(16);
/// Default coalescing interval for resize events.
pub const RESIZE_INTERVAL: Duration = Duration::from_millis(100);

/// Compute the materialized window for a scroll position.
///
/// ```
/// use cacheway::domain::models::GridLayout;
/// use cacheway::services::compute_window;
///
/// let layout = GridLayout::new(100.0, 4, 400.0);
/// let window = compute_window(&layout, 100, 0.0);
/// assert_eq!((window.start_index, window.end_index), (0, 20));
/// ```
pub fn compute_window(layout: &GridLayout, total: usize, scroll_offset: f64) -> VirtualWindow {
    let row_height = layout.row_height();
    if total == 0 || row_height.is_nan() || row_height <= 0.0 {
        return VirtualWindow::default();
    }

    let columns = layout.columns();
    let scroll_offset = scroll_offset.max(0.0);
    let viewport_height = layout.viewport_height.max(0.0);

    // Float to usize casts saturate.
    let first_row = (scroll_offset / row_height).floor() as usize;
    let visible_rows = (viewport_height / row_height).ceil() as usize;

    let start_index = first_row.saturating_mul(columns).min(total);
    let end_index = start_index
        .saturating_add(visible_rows.saturating_mul(columns))
        .saturating_add(columns)
        .min(total);

    VirtualWindow {
        start_index,
        end_index,
        offset: (start_index / columns) as f64 * row_height,
        total_height: total.div_ceil(columns) as f64 * row_height,
    }
}

/// Trailing-edge coalescing of bursty updates.
///
/// Every push replaces the pending value and restarts the interval; the
/// value is released once the interval passes without another push.
#[derive(Debug, Clone)]
pub struct Coalescer<T> {
    interval: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Coalescer<T> {
    /// Coalescer with nothing pending.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    /// Quiet period before a value is released.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Replace the pending value and restart the interval at `now`.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.interval));
    }

    /// Take the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending.take() {
            Some((value, deadline)) if deadline <= now => Some(value),
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// When the pending value will be released.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Whether a value is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// New container geometry after a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resize {
    /// Items per row
    pub columns: usize,
    /// New container height
    pub viewport_height: f64,
}

/// One materialized slice of the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWindow<N> {
    /// Window the nodes were rendered for
    pub window: VirtualWindow,
    /// Rendered nodes with their absolute item index
    pub nodes: Vec<(usize, N)>,
}

/// Windowed renderer over an arbitrary item type.
///
/// `render` is called with each materialized item and its absolute index.
pub struct VirtualizedGrid<T, R> {
    items: Vec<T>,
    render: R,
    layout: GridLayout,
    scroll_offset: f64,
    window: VirtualWindow,
    scroll: Coalescer<f64>,
    resize: Coalescer<Resize>,
}

impl<T, R> VirtualizedGrid<T, R> {
    /// Grid with the default coalescing intervals.
    pub fn new(items: Vec<T>, layout: GridLayout, render: R) -> Self {
        Self::with_intervals(items, layout, render, SCROLL_INTERVAL, RESIZE_INTERVAL)
    }

    /// Grid with explicit coalescing intervals.
    pub fn with_intervals(
        items: Vec<T>,
        layout: GridLayout,
        render: R,
        scroll_interval: Duration,
        resize_interval: Duration,
    ) -> Self {
        let window = compute_window(&layout, items.len(), 0.0);
        Self {
            items,
            render,
            layout,
            scroll_offset: 0.0,
            window,
            scroll: Coalescer::new(scroll_interval),
            resize: Coalescer::new(resize_interval),
        }
    }

    /// Build a grid whose gap and coalescing intervals come from configuration.
    pub fn from_config(items: Vec<T>, layout: GridLayout, render: R, config: &GridConfig) -> Self {
        Self::with_intervals(
            items,
            layout.with_gap(config.gap),
            render,
            Duration::from_millis(config.scroll_interval_ms),
            Duration::from_millis(config.resize_interval_ms),
        )
    }

    /// Current window.
    pub fn window(&self) -> VirtualWindow {
        self.window
    }

    /// Current layout.
    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Committed scroll offset.
    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// The whole collection.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Replace the collection and recompute immediately.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.recompute();
    }

    /// Record a raw scroll event; applied by a later [`tick`](Self::tick).
    pub fn on_scroll(&mut self, offset: f64, now: Instant) {
        self.scroll.push(offset, now);
    }

    /// Record a raw resize event; applied by a later [`tick`](Self::tick).
    pub fn on_resize(&mut self, resize: Resize, now: Instant) {
        self.resize.push(resize, now);
    }

    /// Apply coalesced updates whose interval has passed.
    ///
    /// Returns whether the window changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut dirty = false;

        if let Some(resize) = self.resize.poll(now) {
            self.layout.columns = resize.columns.max(1);
            self.layout.viewport_height = resize.viewport_height;
            dirty = true;
        }
        if let Some(offset) = self.scroll.poll(now) {
            self.scroll_offset = offset;
            dirty = true;
        }

        dirty && self.recompute()
    }

    /// Earliest instant at which a pending update becomes applicable.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.scroll.deadline(), self.resize.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Sleep through all pending updates and apply them.
    pub async fn settle(&mut self) -> bool {
        let mut changed = false;
        while let Some(deadline) = self.next_deadline() {
            tokio::time::sleep_until(deadline).await;
            changed |= self.tick(Instant::now());
        }
        changed
    }

    fn recompute(&mut self) -> bool {
        let window = compute_window(&self.layout, self.items.len(), self.scroll_offset);
        let changed = window != self.window;
        if changed {
            trace!(
                start = window.start_index,
                end = window.end_index,
                offset = window.offset,
                "virtual window moved"
            );
        }
        self.window = window;
        changed
    }

    /// Materialize the current window.
    pub fn render<N>(&self) -> RenderedWindow<N>
    where
        R: Fn(&T, usize) -> N,
    {
        let window = self.window;
        let nodes = self.items[window.start_index..window.end_index]
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let index = window.start_index + i;
                (index, (self.render)(item, index))
            })
            .collect();

        RenderedWindow { window, nodes }
    }
}
