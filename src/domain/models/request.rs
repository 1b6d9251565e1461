//! Request and response snapshots seen by the network caching proxy.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Content type of the synthesized offline image.
pub const PLACEHOLDER_CONTENT_TYPE: &str = "image/svg+xml";

/// Minimal grey graphic served for image requests when the network is unreachable.
pub const PLACEHOLDER_SVG: &str = r##"<svg width="200" height="200" xmlns="http://www.w3.org/2000/svg"><rect width="100%" height="100%" fill="#ddd"/></svg>"##;

/// What the page intends to do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestDestination {
    /// Page navigation
    Document,
    /// Image; served a placeholder when offline
    Image,
    Script,
    Style,
    Font,
    /// Anything else, including fetch/XHR
    #[default]
    Other,
}

impl RequestDestination {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Script => "script",
            Self::Style => "style",
            Self::Font => "font",
            Self::Other => "other",
        }
    }
}

impl FromStr for RequestDestination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "image" => Ok(Self::Image),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "font" => Ok(Self::Font),
            "other" | "" => Ok(Self::Other),
            other => Err(format!("unknown request destination: {other}")),
        }
    }
}

/// Identity of a cached response: method plus exact URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    /// Uppercase method
    pub method: String,
    /// Exact URL, query included
    pub url: String,
}

impl RequestKey {
    /// Key for `method` and `url`; the method is uppercased.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url: url.into(),
        }
    }

    /// Key for a GET of `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An outgoing page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Uppercase method
    pub method: String,
    /// Absolute request URL
    pub url: Url,
    /// What the page will do with the response
    pub destination: RequestDestination,
}

impl ProxyRequest {
    /// Request with an `Other` destination.
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url,
            destination: RequestDestination::Other,
        }
    }

    /// GET request for `url`.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Set the destination.
    pub fn with_destination(mut self, destination: RequestDestination) -> Self {
        self.destination = destination;
        self
    }

    /// Whether this is a GET.
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Only http and https requests are network requests.
    pub fn is_network_scheme(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    /// Cache key of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), self.url.as_str())
    }
}

/// A response as returned by the network or replayed from a partition.
///
/// Cloning is cheap: the body is reference counted, so a clone is an
/// independent consumable duplicate of the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    /// HTTP status
    pub status: u16,
    /// Headers in received order
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Bytes,
}

impl ProxyResponse {
    /// Response without headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Only 200 counts as OK.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// The grey offline image.
    pub fn placeholder_image() -> Self {
        Self::new(200, Bytes::from_static(PLACEHOLDER_SVG.as_bytes()))
            .with_header("Content-Type", PLACEHOLDER_CONTENT_TYPE)
    }
}

/// A response snapshot persisted in a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    /// Request identity
    pub key: RequestKey,
    /// Stored response
    pub response: ProxyResponse,
    /// When the response was stored
    pub stored_at: DateTime<Utc>,
}

impl StoredResponse {
    /// Snapshot `response` now.
    pub fn new(key: RequestKey, response: ProxyResponse) -> Self {
        Self {
            key,
            response,
            stored_at: Utc::now(),
        }
    }
}
