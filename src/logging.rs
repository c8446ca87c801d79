//! Tracing subscriber setup shared by the CLI and the web server.
//!
//! The console filter comes from `LOG_LEVEL`, then `RUST_LOG`, then the
//! caller's default. HTTP access lines are emitted on the `access` target.
//!
//! With a log directory configured, events are also written to daily-rotated
//! files there (five kept per sink):
//!
//! | file | content |
//! |---|---|
//! | `app.*.log` | everything the console filter lets through |
//! | `error.*.log` | `ERROR` only |
//! | `debug.*.log` | this crate at `DEBUG` and above |
//! | `processing.*.log` | pipeline, watcher and batch events |
//! | `access.*.log` | one line per HTTP request |
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::{Filter, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::error::{Error, Result};
use crate::types::LogFormat;

pub const ACCESS_TARGET: &str = "access";

/// Rotated files kept per sink
pub const LOG_FILES_KEPT: usize = 5;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the background file writers alive; dropping it flushes them.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _workers: Vec<WorkerGuard>,
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer {
    match format {
        LogFormat::Human => fmt::layer().with_target(true).with_filter(filter).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer<F>(
    dir: &Path,
    prefix: &str,
    filter: F,
    workers: &mut Vec<WorkerGuard>,
) -> Result<BoxedLayer>
where
    F: Filter<Registry> + Send + Sync + 'static,
{
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(LOG_FILES_KEPT)
        .build(dir)
        .map_err(Error::external)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    workers.push(guard);
    Ok(fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter)
        .boxed())
}

/// One layer per log file under `dir`; `app_filter` selects what goes to `app.*.log`.
pub fn file_layers(
    dir: &Path,
    app_filter: EnvFilter,
) -> Result<(Vec<BoxedLayer>, Vec<WorkerGuard>)> {
    std::fs::create_dir_all(dir)?;
    let crate_name = env!("CARGO_CRATE_NAME");
    let mut workers = Vec::new();

    let processing = Targets::new()
        .with_target(format!("{crate_name}::core"), Level::INFO)
        .with_target(format!("{crate_name}::watcher"), Level::INFO)
        .with_target(format!("{crate_name}::api"), Level::INFO)
        .with_target(format!("{crate_name}::web::upload"), Level::INFO);

    let layers = vec![
        file_layer(dir, "app", app_filter, &mut workers)?,
        file_layer(dir, "error", LevelFilter::ERROR, &mut workers)?,
        file_layer(
            dir,
            "debug",
            Targets::new().with_target(crate_name, Level::DEBUG),
            &mut workers,
        )?,
        file_layer(dir, "processing", processing, &mut workers)?,
        file_layer(
            dir,
            ACCESS_TARGET,
            Targets::new().with_target(ACCESS_TARGET, Level::INFO),
            &mut workers,
        )?,
    ];
    Ok((layers, workers))
}

/// Install the global subscriber: console output plus, when `log_dir` is set,
/// the rotating files. A subscriber that is already installed is left alone.
pub fn init(format: LogFormat, default_level: &str, log_dir: Option<&Path>) -> Result<LogGuard> {
    let mut layers = vec![console_layer(format, env_filter(default_level))];
    let mut workers = Vec::new();
    if let Some(dir) = log_dir {
        let (files, guards) = file_layers(dir, env_filter(default_level))?;
        layers.extend(files);
        workers = guards;
    }

    if tracing_subscriber::registry().with(layers).try_init().is_ok() {
        if let Some(dir) = log_dir {
            tracing::info!("Writing log files to {:?}", dir);
        }
    }
    Ok(LogGuard { _workers: workers })
}
