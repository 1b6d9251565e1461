//! Lazy image loading
//!
//! Each mounted image runs a small state machine:
//!
//! ```text
//! PlaceholderShown -> Loading -> Loaded
//!                            \-> Failed   (shows the placeholder again, no retry)
//! ```
//!
//! High-priority images start loading on mount. Everything else waits for a
//! one-shot [`ViewportTrigger`]. Loading consults the shared [`ObjectCache`]
//! under `img_<url>` before touching the network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::models::{Config, RegionId, PLACEHOLDER_SVG};
use crate::domain::ports::{ResourceLoader, VisibilityObserver};
use crate::services::object_cache::ObjectCache;
use crate::services::viewport_trigger::{TriggerConfig, ViewportTrigger};

/// TTL of lazily loaded images in the object cache (10 minutes).
pub const IMAGE_TTL: Duration = Duration::from_millis(600_000);

/// Lifecycle of one mounted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    /// Waiting for visibility
    PlaceholderShown,
    /// Fetch in flight; still shows the placeholder
    Loading,
    /// Shows the loaded bytes
    Loaded,
    /// Terminal; displays the placeholder exactly like `PlaceholderShown`
    Failed,
}

impl ImageState {
    /// `Loaded` or `Failed`.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

/// What the image currently displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    /// Current lifecycle state
    pub state: ImageState,
    /// Bytes being displayed
    pub source: Bytes,
}

/// Mount options for one image.
#[derive(Debug, Clone)]
pub struct LazyImageOptions {
    /// Image URL
    pub src: String,
    /// Observed region
    pub region: RegionId,
    /// Load on mount without waiting for visibility
    pub priority: bool,
    /// Shown until the image loads and after a failure
    pub placeholder: Bytes,
}

impl LazyImageOptions {
    /// Low-priority image with the default placeholder.
    pub fn new(src: impl Into<String>, region: RegionId) -> Self {
        Self {
            src: src.into(),
            region,
            priority: false,
            placeholder: Bytes::from_static(PLACEHOLDER_SVG.as_bytes()),
        }
    }

    /// Load immediately, bypassing visibility observation.
    pub fn high_priority(mut self) -> Self {
        self.priority = true;
        self
    }

    /// Replace the placeholder.
    pub fn with_placeholder(mut self, placeholder: impl Into<Bytes>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

/// Object cache key for an image URL.
pub fn image_cache_key(src: &str) -> String {
    format!("img_{src}")
}

struct LoadContext {
    src: String,
    placeholder: Bytes,
    cache: Arc<ObjectCache<Bytes>>,
    loader: Arc<dyn ResourceLoader>,
    ttl: Duration,
    started: AtomicBool,
    view: watch::Sender<ImageView>,
}

impl LoadContext {
    /// Enter `Loading`. Runs at most once per mount.
    fn begin(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }

        self.show(ImageState::Loading, self.placeholder.clone());

        let key = image_cache_key(&self.src);
        if let Some(cached) = self.cache.get(&key) {
            debug!(src = %self.src, "image served from object cache");
            self.show(ImageState::Loaded, cached);
            return;
        }

        let context = Arc::clone(self);
        tokio::spawn(async move {
            match context.loader.load_image(&context.src).await {
                Ok(data) => {
                    context.cache.set_with_ttl(key, data.clone(), context.ttl);
                    context.show(ImageState::Loaded, data);
                }
                Err(err) => {
                    warn!(src = %context.src, error = %err, "image failed to load, keeping placeholder");
                    context.show(ImageState::Failed, context.placeholder.clone());
                }
            }
        });
    }

    fn show(&self, state: ImageState, source: Bytes) {
        self.view.send_replace(ImageView { state, source });
    }
}

/// Mounts lazily loaded images against shared ports.
#[derive(Clone)]
pub struct LazyImageLoader {
    cache: Arc<ObjectCache<Bytes>>,
    loader: Arc<dyn ResourceLoader>,
    observer: Arc<dyn VisibilityObserver>,
    trigger: TriggerConfig,
    ttl: Duration,
}

impl LazyImageLoader {
    /// Loader with the default trigger options and image TTL.
    pub fn new(
        cache: Arc<ObjectCache<Bytes>>,
        loader: Arc<dyn ResourceLoader>,
        observer: Arc<dyn VisibilityObserver>,
    ) -> Self {
        Self {
            cache,
            loader,
            observer,
            trigger: TriggerConfig::lazy_image(),
            ttl: IMAGE_TTL,
        }
    }

    /// Override the observation options.
    pub fn with_trigger_config(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = trigger;
        self
    }

    /// Override how long loaded images stay cached.
    pub fn with_image_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Apply the configured lazy-image observation options and image TTL.
    pub fn with_config(self, config: &Config) -> Self {
        self.with_trigger_config(TriggerConfig::lazy_image_from(&config.viewport))
            .with_image_ttl(Duration::from_millis(config.object_cache.image_ttl_ms))
    }

    /// Mount an image. Must be called inside a tokio runtime.
    pub fn mount(&self, options: LazyImageOptions) -> LazyImage {
        let (view, receiver) = watch::channel(ImageView {
            state: ImageState::PlaceholderShown,
            source: options.placeholder.clone(),
        });

        let context = Arc::new(LoadContext {
            src: options.src.clone(),
            placeholder: options.placeholder,
            cache: Arc::clone(&self.cache),
            loader: Arc::clone(&self.loader),
            ttl: self.ttl,
            started: AtomicBool::new(false),
            view,
        });

        let trigger = if options.priority {
            context.begin();
            None
        } else {
            Some(ViewportTrigger::observe(
                self.observer.as_ref(),
                options.region,
                self.trigger,
                move || context.begin(),
            ))
        };

        LazyImage {
            src: options.src,
            view: receiver,
            trigger,
        }
    }
}

/// Handle to a mounted image. Dropping it unmounts the image and releases
/// its visibility observation; an in-flight load finishes unobserved.
pub struct LazyImage {
    src: String,
    view: watch::Receiver<ImageView>,
    trigger: Option<ViewportTrigger>,
}

impl LazyImage {
    /// Image URL.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Current state.
    pub fn state(&self) -> ImageState {
        self.view.borrow().state
    }

    /// Current state and displayed bytes.
    pub fn view(&self) -> ImageView {
        self.view.borrow().clone()
    }

    /// Whether the image still holds a visibility observation.
    pub fn is_observing(&self) -> bool {
        self.trigger
            .as_ref()
            .is_some_and(ViewportTrigger::is_observing)
    }

    /// Wait until the image is `Loaded` or `Failed`.
    ///
    /// Returns the current view early if loading can no longer start.
    pub async fn settled(&mut self) -> ImageView {
        let settled = match self.view.wait_for(|view| view.state.is_settled()).await {
            Ok(view) => Some(view.clone()),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.view.borrow().clone())
    }

    /// Drop the image, releasing its visibility observation.
    pub fn unmount(self) {}
}
