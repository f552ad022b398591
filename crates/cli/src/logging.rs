//! Tracing setup
//!
//! Everything goes to stderr. When a state directory is given, the activity
//! record (plus warnings and errors) is also appended to `activity.log`.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

pub use autocommit_core::ACTIVITY_TARGET;

/// File name of the activity log inside the state directory
pub const ACTIVITY_LOG: &str = "activity.log";

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init(activity_dir: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let stderr_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_level);

    let (file_layer, guard) = match activity_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, ACTIVITY_LOG);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(filter_fn(is_activity));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn is_activity(meta: &tracing::Metadata<'_>) -> bool {
    meta.target() == ACTIVITY_TARGET || *meta.level() <= Level::WARN
}
