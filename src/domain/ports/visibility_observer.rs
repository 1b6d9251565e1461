//! Visibility observation port.

use crate::domain::models::{IntersectionEntry, ObserverOptions, RegionId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A live visibility observation of one region
///
/// Entries keep arriving until `token` is cancelled. Cancelling the token
/// releases the observation on the observer side.
#[derive(Debug)]
pub struct Subscription {
    /// Entries for the observed region
    pub entries: mpsc::UnboundedReceiver<IntersectionEntry>,
    /// Cancel to release the observation
    pub token: CancellationToken,
}

/// Port for the platform visibility-observation primitive
///
/// Implementations deliver an initial entry for the region's current state
/// and a new entry whenever its intersection with the (margin-grown)
/// viewport changes.
pub trait VisibilityObserver: Send + Sync {
    fn observe(&self, region: RegionId, options: ObserverOptions) -> Subscription;
}
