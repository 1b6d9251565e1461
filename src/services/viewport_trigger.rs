//! Viewport visibility trigger
//!
//! Binds one observed region to one callback. The trigger owns the
//! observation's cancellation token and cancels it on every exit path:
//! one-shot firing, explicit disposal, drop, or the observer going away.
//!
//! Two modes exist:
//! - `OneShot` (lazy images): fires once, then tears the observation down.
//! - `Rearm` (infinite scroll): fires, then stays quiet until the caller
//!   calls [`ViewportTrigger::reset_fetching`] after its async work is done.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::domain::models::{IntersectionEntry, ObserverOptions, RegionId, ViewportConfig};
use crate::domain::ports::{Subscription, VisibilityObserver};

/// What happens after the trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Release the observation after the first firing
    OneShot,
    /// Keep observing; fire again only after `reset_fetching`
    Rearm,
}

/// Observation options plus firing mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    /// Observation options
    pub options: ObserverOptions,
    /// Firing mode
    pub mode: TriggerMode,
}

impl TriggerConfig {
    /// One-shot, 10% visible, 50px early.
    pub const fn lazy_image() -> Self {
        Self {
            options: ObserverOptions::new(0.1, 50.0),
            mode: TriggerMode::OneShot,
        }
    }

    /// Re-armable, fully visible, 100px early.
    pub const fn infinite_scroll() -> Self {
        Self {
            options: ObserverOptions::new(1.0, 100.0),
            mode: TriggerMode::Rearm,
        }
    }

    /// One-shot lazy-image trigger from configuration.
    pub fn lazy_image_from(config: &ViewportConfig) -> Self {
        Self {
            options: ObserverOptions::new(config.lazy_image_threshold, config.lazy_image_margin),
            mode: TriggerMode::OneShot,
        }
    }

    /// Re-armable infinite-scroll trigger from configuration.
    pub fn infinite_scroll_from(config: &ViewportConfig) -> Self {
        Self {
            options: ObserverOptions::new(
                config.infinite_scroll_threshold,
                config.infinite_scroll_margin,
            ),
            mode: TriggerMode::Rearm,
        }
    }
}

struct TriggerShared {
    fetching: AtomicBool,
    has_more: AtomicBool,
    fired: AtomicUsize,
    rearm: Notify,
}

impl TriggerShared {
    /// Claim the right to fire. Fails while a previous firing is unacknowledged.
    fn try_begin(&self) -> bool {
        self.has_more.load(Ordering::Acquire)
            && self
                .fetching
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}

/// A subscription that fires a callback when its region becomes visible.
///
/// Must be created inside a tokio runtime; the observation is processed by a
/// spawned task.
pub struct ViewportTrigger {
    region: RegionId,
    shared: Arc<TriggerShared>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ViewportTrigger {
    /// Start observing `region` and call `callback` when it qualifies.
    pub fn observe<F>(
        observer: &dyn VisibilityObserver,
        region: RegionId,
        config: TriggerConfig,
        callback: F,
    ) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let Subscription { entries, token } = observer.observe(region, config.options);
        let shared = Arc::new(TriggerShared {
            fetching: AtomicBool::new(false),
            has_more: AtomicBool::new(true),
            fired: AtomicUsize::new(0),
            rearm: Notify::new(),
        });

        let task = tokio::spawn(watch_region(
            entries,
            token.clone(),
            Arc::clone(&shared),
            config,
            callback,
        ));

        debug!(region = ?region, mode = ?config.mode, "viewport trigger armed");

        Self {
            region,
            shared,
            token,
            task,
        }
    }

    /// Observed region.
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// Re-arm after the caller's async work completes.
    ///
    /// If the region still qualifies, the trigger fires again without
    /// waiting for a new visibility change.
    pub fn reset_fetching(&self) {
        self.shared.fetching.store(false, Ordering::Release);
        self.shared.rearm.notify_one();
    }

    /// Whether a firing is waiting for `reset_fetching`.
    pub fn is_fetching(&self) -> bool {
        self.shared.fetching.load(Ordering::Acquire)
    }

    /// Gate firing on whether the caller has anything more to load.
    pub fn set_has_more(&self, has_more: bool) {
        self.shared.has_more.store(has_more, Ordering::Release);
        if has_more {
            self.shared.rearm.notify_one();
        }
    }

    /// Number of times the callback has run.
    pub fn fire_count(&self) -> usize {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// Whether the observation is still held.
    pub fn is_observing(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Release the observation. Equivalent to dropping the trigger.
    pub fn dispose(self) {}
}

impl Drop for ViewportTrigger {
    fn drop(&mut self) {
        self.token.cancel();
        self.task.abort();
    }
}

async fn watch_region<F>(
    mut entries: mpsc::UnboundedReceiver<IntersectionEntry>,
    token: CancellationToken,
    shared: Arc<TriggerShared>,
    config: TriggerConfig,
    mut callback: F,
) where
    F: FnMut() + Send + 'static,
{
    let mut last: Option<IntersectionEntry> = None;

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            entry = entries.recv() => match entry {
                Some(entry) => {
                    trace!(
                        region = ?entry.region,
                        ratio = entry.intersection_ratio,
                        intersecting = entry.is_intersecting,
                        "intersection entry"
                    );
                    last = Some(entry);
                }
                None => break,
            },
            () = shared.rearm.notified() => {}
        }

        let qualifies = last.is_some_and(|entry| entry.crosses(config.options.threshold));
        if qualifies && shared.try_begin() {
            shared.fired.fetch_add(1, Ordering::AcqRel);
            callback();

            if config.mode == TriggerMode::OneShot {
                break;
            }
        }
    }

    token.cancel();
}
