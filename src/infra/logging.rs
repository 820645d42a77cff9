// ============================================================
// Layer 6 — Logging
// ============================================================
// One JSON object per event, written to two places:
//
//   stderr                          ← for the terminal / container logs
//   logs/heart-mlops.log.YYYY-MM-DD ← daily-rolled file (tracing-appender)
//
//   {"timestamp":"...","level":"INFO","fields":{"message":"..."},
//    "target":"heart_mlops::...","filename":"src/...","line_number":42}
//
// RUST_LOG overrides the default filter `heart_mlops=info`.
// The returned WorkerGuard flushes the file writer when dropped,
// so main() keeps it alive for the whole process.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub const DEFAULT_FILTER: &str = "heart_mlops=info";
pub const LOG_FILE_PREFIX: &str = "heart-mlops.log";

fn json_layer<S, W>(writer: W) -> impl Layer<S> + Send + Sync + 'static
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(writer)
}

/// Install the global subscriber.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Cannot create log directory '{}'", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer(std::io::stderr))
        .with(json_layer(file_writer))
        .try_init()
        .context("Logging was already initialised")?;

    Ok(guard)
}
