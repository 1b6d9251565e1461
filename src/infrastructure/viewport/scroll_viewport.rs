//! Scrollable viewport simulation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::domain::models::{IntersectionEntry, ObserverOptions, Rect, RegionId};
use crate::domain::ports::{Subscription, VisibilityObserver};

struct Observation {
    region: RegionId,
    options: ObserverOptions,
    sender: mpsc::UnboundedSender<IntersectionEntry>,
    token: CancellationToken,
    /// (intersecting, crosses threshold) of the last delivered entry
    last: Option<(bool, bool)>,
}

impl Observation {
    fn is_released(&self) -> bool {
        self.token.is_cancelled() || self.sender.is_closed()
    }

    /// Deliver an entry if the region's visibility state changed.
    fn update(&mut self, bounds: Rect, root: Rect) {
        let entry = IntersectionEntry::compute(self.region, bounds, root, &self.options);
        let state = (entry.is_intersecting, entry.crosses(self.options.threshold));
        if self.last == Some(state) {
            return;
        }
        self.last = Some(state);
        trace!(region = ?self.region, ratio = entry.intersection_ratio, "visibility changed");
        // A send failure means the receiver is gone; pruned on the next pass.
        let _ = self.sender.send(entry);
    }
}

struct ViewportState {
    width: f64,
    height: f64,
    scroll_offset: f64,
    regions: HashMap<RegionId, Rect>,
    observations: Vec<Observation>,
}

impl ViewportState {
    fn root(&self) -> Rect {
        Rect::new(0.0, self.scroll_offset, self.width, self.height)
    }

    fn refresh(&mut self) {
        self.observations.retain(|observation| !observation.is_released());
        let root = self.root();
        for observation in &mut self.observations {
            if let Some(bounds) = self.regions.get(&observation.region) {
                observation.update(*bounds, root);
            }
        }
    }
}

/// Geometric VisibilityObserver for a vertically scrolling viewport
///
/// Regions are placed in document coordinates. Observers receive an entry
/// as soon as their region is placed and then whenever its intersecting or
/// threshold state changes due to scrolling, resizing or re-placement.
#[derive(Clone)]
pub struct ScrollViewport {
    state: Arc<Mutex<ViewportState>>,
}

impl ScrollViewport {
    /// Viewport of the given size at scroll offset 0.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewportState {
                width,
                height,
                scroll_offset: 0.0,
                regions: HashMap::new(),
                observations: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place (or move) a region.
    pub fn place(&self, region: RegionId, bounds: Rect) {
        let mut state = self.lock();
        state.regions.insert(region, bounds);
        state.refresh();
    }

    /// Remove a region from the page. Existing observations stay registered
    /// but receive nothing until it is placed again.
    pub fn remove(&self, region: RegionId) {
        self.lock().regions.remove(&region);
    }

    /// Scroll to `offset` and notify affected observations.
    pub fn scroll_to(&self, offset: f64) {
        let mut state = self.lock();
        state.scroll_offset = offset.max(0.0);
        state.refresh();
    }

    /// Resize and notify affected observations.
    pub fn resize(&self, width: f64, height: f64) {
        let mut state = self.lock();
        state.width = width;
        state.height = height;
        state.refresh();
    }

    /// Current scroll offset.
    pub fn scroll_offset(&self) -> f64 {
        self.lock().scroll_offset
    }

    /// Number of observations that have not been released.
    pub fn active_observations(&self) -> usize {
        let mut state = self.lock();
        state.observations.retain(|observation| !observation.is_released());
        state.observations.len()
    }
}

impl VisibilityObserver for ScrollViewport {
    fn observe(&self, region: RegionId, options: ObserverOptions) -> Subscription {
        let (sender, entries) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let mut observation = Observation {
            region,
            options,
            sender,
            token: token.clone(),
            last: None,
        };

        let mut state = self.lock();
        if let Some(bounds) = state.regions.get(&region) {
            observation.update(*bounds, state.root());
        }
        state.observations.push(observation);

        Subscription { entries, token }
    }
}
