//! Geometry shared by visibility observation and its consumers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one observed region (an element on the page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(Uuid);

impl RegionId {
    /// Fresh random region id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis-aligned rectangle in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Rectangle from origin and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area, zero for degenerate rectangles.
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Overlap of two rectangles; edge-adjacent rectangles yield a zero-area rect.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            None
        } else {
            Some(Self::new(left, top, right - left, bottom - top))
        }
    }
}

/// Configuration of one visibility observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverOptions {
    /// Fraction of the region (0.0 to 1.0) that must be visible
    pub threshold: f64,
    /// Distance in pixels by which the viewport is grown before testing
    pub root_margin: f64,
}

impl ObserverOptions {
    /// Options with the given threshold and margin.
    pub const fn new(threshold: f64, root_margin: f64) -> Self {
        Self {
            threshold,
            root_margin,
        }
    }
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// One visibility notification for an observed region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    /// Observed region
    pub region: RegionId,
    /// Whether any part of the region is inside the grown viewport
    pub is_intersecting: bool,
    /// Visible fraction of the region
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    /// Compute the entry for `bounds` against `root` grown by the root margin.
    pub fn compute(region: RegionId, bounds: Rect, root: Rect, options: &ObserverOptions) -> Self {
        let root = root.expand(options.root_margin);
        let (is_intersecting, intersection_ratio) = match bounds.intersection(&root) {
            None => (false, 0.0),
            Some(_) if bounds.area() == 0.0 => (true, 1.0),
            Some(overlap) => (true, (overlap.area() / bounds.area()).clamp(0.0, 1.0)),
        };

        Self {
            region,
            is_intersecting,
            intersection_ratio,
        }
    }

    /// Whether this entry satisfies the observation threshold.
    pub fn crosses(&self, threshold: f64) -> bool {
        self.is_intersecting && self.intersection_ratio >= threshold
    }
}
