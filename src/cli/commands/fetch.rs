//! Single request through the proxy.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use url::Url;

use crate::cli::build_proxy;
use crate::cli::output::{format_size, output, CommandOutput};
use crate::domain::models::{Config, ProxyRequest, RequestDestination};
use crate::services::{Interception, ProxyPhase, ResponseSource};

/// Arguments of the fetch command.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Absolute URL to request
    pub url: Url,

    /// Request destination (document, image, script, style, font, other)
    #[arg(short, long, default_value = "other")]
    pub destination: RequestDestination,
}

/// Result of one intercepted request.
#[derive(Debug, Serialize)]
pub struct FetchOutput {
    /// Requested URL
    pub url: String,
    /// Whether the proxy answered the request
    pub handled: bool,
    /// Response status, when handled
    pub status: Option<u16>,
    /// Response content type, when known
    pub content_type: Option<String>,
    /// Body size in bytes
    pub size: usize,
    /// Where the response came from
    pub source: String,
}

impl CommandOutput for FetchOutput {
    fn to_human(&self) -> String {
        if !self.handled {
            return format!("{} passed through without interception", self.url);
        }
        format!(
            "{}\n  status:       {}\n  content type: {}\n  size:         {}\n  source:       {}",
            self.url,
            self.status.map_or_else(|| "-".to_string(), |s| s.to_string()),
            self.content_type.as_deref().unwrap_or("-"),
            format_size(self.size),
            self.source,
        )
    }
}

/// Send one request through an installed proxy.
pub async fn execute(args: FetchArgs, config: &Config, json_mode: bool) -> Result<()> {
    let proxy = build_proxy(config)?;
    // The CLI runs a fresh proxy per invocation; activation only drops
    // stale partitions, it never fetches.
    if proxy.phase().await != ProxyPhase::Active {
        proxy.activate().await.context("proxy activation failed")?;
    }

    let request = ProxyRequest::get(args.url.clone()).with_destination(args.destination);
    let interception = proxy
        .intercept(&request)
        .await
        .with_context(|| format!("request to {} failed", args.url))?;
    proxy.flush().await;

    let result = match interception {
        Interception::PassThrough => FetchOutput {
            url: args.url.to_string(),
            handled: false,
            status: None,
            content_type: None,
            size: 0,
            source: "pass-through".to_string(),
        },
        Interception::Respond { response, source } => FetchOutput {
            url: args.url.to_string(),
            handled: true,
            status: Some(response.status),
            content_type: response.content_type().map(ToString::to_string),
            size: response.body.len(),
            source: match source {
                ResponseSource::Cache(partition) => format!("cache ({partition})"),
                ResponseSource::Network => "network".to_string(),
                ResponseSource::Fallback => "offline placeholder".to_string(),
            },
        },
    };

    output(&result, json_mode);
    Ok(())
}
