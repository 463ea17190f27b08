//! File logging.
//!
//! The TUI owns the terminal, so tracing output goes to a daily rolling file
//! under the user's data directory instead of stdout.

use color_eyre::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "maestro.log";
const DEFAULT_FILTER: &str = "maestro=debug,warn";

/// `$XDG_DATA_HOME/maestro/logs`, or `.logs` when there is no data directory
pub fn log_dir() -> PathBuf {
  dirs::data_dir()
    .map(|dir| dir.join("maestro").join("logs"))
    .unwrap_or_else(|| PathBuf::from(".logs"))
}

/// Install the global subscriber.
///
/// The level comes from `RUST_LOG`, falling back to debug for this crate and
/// warn for dependencies. Buffered lines are flushed when the returned guard
/// is dropped, so keep it alive until exit.
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir();
  std::fs::create_dir_all(&dir)?;

  let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  let layer = fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  tracing_subscriber::registry()
    .with(filter)
    .with(layer)
    .try_init()?;

  tracing::info!(dir = %dir.display(), "logging initialized");
  Ok(guard)
}
