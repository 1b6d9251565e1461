//! tracing subscriber setup.

use super::config::{LogConfig, LogFormat, RotationPolicy};
use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_NAME: &str = "cacheway.log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Logger implementation using tracing
///
/// Holds the file writer guard; dropping the logger flushes and stops file
/// output.
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Install the global subscriber described by `config`.
    ///
    /// `RUST_LOG` directives, when set, refine the configured level. Fails if
    /// a global subscriber is already installed.
    pub fn init(config: &LogConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let mut guard = None;
        let file_layer = config.log_dir.as_deref().map(|log_dir| {
            let (writer, file_guard) =
                tracing_appender::non_blocking(file_appender(log_dir, config.rotation));
            guard = Some(file_guard);

            // Files are always JSON.
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        });

        let stdout_layer = config
            .enable_stdout
            .then(|| stdout_layer(config.format));

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stdout_layer)
            .with(env_filter)
            .try_init()
            .context("failed to install global tracing subscriber")?;

        tracing::info!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }

    /// Whether log lines are also written to rolling files.
    pub fn has_file_output(&self) -> bool {
        self._guard.is_some()
    }
}

fn file_appender(log_dir: &Path, rotation: RotationPolicy) -> RollingFileAppender {
    match rotation {
        RotationPolicy::Daily => rolling::daily(log_dir, LOG_FILE_NAME),
        RotationPolicy::Hourly => rolling::hourly(log_dir, LOG_FILE_NAME),
        RotationPolicy::Never => rolling::never(log_dir, LOG_FILE_NAME),
    }
}

fn stdout_layer<S>(format: LogFormat) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stdout)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(io::stdout)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
