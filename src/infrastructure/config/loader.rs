//! Layered configuration loading and validation.

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;
use url::Url;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_entries: {0}. Must be at least 1")]
    InvalidMaxEntries(usize),

    #[error("Invalid TTL for {0}: must be greater than zero")]
    InvalidTtl(&'static str),

    #[error("Invalid threshold for {name}: {value}. Must be between 0 and 1")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Invalid margin for {name}: {value}. Cannot be negative")]
    InvalidMargin { name: &'static str, value: f64 },

    #[error("Invalid partition names: {0}")]
    InvalidPartitions(String),

    #[error("Invalid origin: {0}. Must be an absolute http(s) URL")]
    InvalidOrigin(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .cacheway/config.yaml (project config)
    /// 3. .cacheway/local.yaml (local overrides, optional)
    /// 4. Environment variables (CACHEWAY_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".cacheway/config.yaml"))
            .merge(Yaml::file(".cacheway/local.yaml"))
            .merge(Env::prefixed("CACHEWAY_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Environment variables still override the file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("CACHEWAY_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let cache = &config.object_cache;
        if cache.max_entries == 0 {
            return Err(ConfigError::InvalidMaxEntries(cache.max_entries));
        }
        if cache.default_ttl_ms == 0 {
            return Err(ConfigError::InvalidTtl("object_cache.default_ttl_ms"));
        }
        if cache.image_ttl_ms == 0 {
            return Err(ConfigError::InvalidTtl("object_cache.image_ttl_ms"));
        }

        let proxy = &config.proxy;
        if proxy.static_partition.is_empty() || proxy.dynamic_partition.is_empty() {
            return Err(ConfigError::InvalidPartitions(
                "partition names cannot be empty".to_string(),
            ));
        }
        if proxy.static_partition == proxy.dynamic_partition {
            return Err(ConfigError::InvalidPartitions(format!(
                "static and dynamic partitions share the name '{}'",
                proxy.static_partition
            )));
        }
        match Url::parse(&proxy.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidOrigin(proxy.origin.clone())),
        }
        if proxy.store_dir.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "proxy.store_dir cannot be empty".to_string(),
            ));
        }

        let viewport = &config.viewport;
        for (name, value) in [
            ("viewport.lazy_image_threshold", viewport.lazy_image_threshold),
            ("viewport.infinite_scroll_threshold", viewport.infinite_scroll_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        for (name, value) in [
            ("viewport.lazy_image_margin", viewport.lazy_image_margin),
            ("viewport.infinite_scroll_margin", viewport.infinite_scroll_margin),
            ("grid.gap", config.grid.gap),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::InvalidMargin { name, value });
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
