//! Preload requests and batch outcomes.

use serde::{Deserialize, Serialize};

/// Kind of resource a preload request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Resolves once the image decodes
    Image,
    /// JavaScript
    Script,
    /// Stylesheet
    Style,
}

impl ResourceKind {
    /// Lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Script => "script",
            Self::Style => "style",
        }
    }
}

/// Issue order of a preload request.
///
/// Ordered so that `High` sorts before `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreloadPriority {
    /// Issued before every `Low` request
    High,
    #[default]
    Low,
}

/// A request to eventually have a resource resident and ready.
///
/// Exists only for the duration of one preload batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadResource {
    /// Resource URL
    pub url: String,
    /// Kind of resource
    pub kind: ResourceKind,
    /// Issue order
    #[serde(default)]
    pub priority: PreloadPriority,
}

impl PreloadResource {
    /// Low-priority request for `url`.
    pub fn new(url: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            url: url.into(),
            kind,
            priority: PreloadPriority::Low,
        }
    }

    /// Low-priority image request.
    pub fn image(url: impl Into<String>) -> Self {
        Self::new(url, ResourceKind::Image)
    }

    /// Low-priority script request.
    pub fn script(url: impl Into<String>) -> Self {
        Self::new(url, ResourceKind::Script)
    }

    /// Low-priority stylesheet request.
    pub fn style(url: impl Into<String>) -> Self {
        Self::new(url, ResourceKind::Style)
    }

    /// Raise to high priority.
    pub fn high(mut self) -> Self {
        self.priority = PreloadPriority::High;
        self
    }
}

/// Outcome of a settled preload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// URLs that became resident, in completion order
    pub loaded: Vec<String>,
    /// URLs that failed, with the failure reason
    pub failed: Vec<(String, String)>,
}

impl PreloadReport {
    /// Whether nothing failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
