//! Visibility observation adapters

mod scroll_viewport;

pub use scroll_viewport::ScrollViewport;
