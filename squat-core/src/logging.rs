use chrono::{Local, NaiveDate};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const LOG_FILE_NAME: &str = "squat-scan.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where log lines go. `Stderr` touches nothing on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
  File,
  FileAndStderr,
  Stderr,
}

pub fn init_file_only(log_dir: &Path, level: &str, retention_days: u64) -> anyhow::Result<()> {
  init(LogOutput::File, log_dir, level, retention_days)
}

pub fn init_file_and_stderr(
  log_dir: &Path,
  level: &str,
  retention_days: u64,
) -> anyhow::Result<()> {
  init(LogOutput::FileAndStderr, log_dir, level, retention_days)
}

/// Used by `--dry-run`.
pub fn init_stderr_only(level: &str) -> anyhow::Result<()> {
  init(LogOutput::Stderr, Path::new(""), level, 0)
}

pub fn init(output: LogOutput, log_dir: &Path, level: &str, retention_days: u64) -> anyhow::Result<()> {
  let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
  let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
  let mut removed = 0;

  if output != LogOutput::Stderr {
    fs::create_dir_all(log_dir)?;
    removed = remove_expired_logs(log_dir, retention_days, Local::now().date_naive());

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
      log_dir,
      LOG_FILE_NAME,
    ));
    let _ = FILE_GUARD.set(guard);
    layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
  }

  if output != LogOutput::File {
    layers.push(
      fmt::layer()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .boxed(),
    );
  }

  tracing_subscriber::registry()
    .with(layers)
    .with(filter)
    .try_init()?;

  if removed > 0 {
    tracing::info!(removed, dir = %log_dir.display(), "expired log files removed");
  }
  Ok(())
}

/// Deletes rolled logs whose date suffix is more than `retention_days` before `today`.
/// Zero keeps everything.
fn remove_expired_logs(log_dir: &Path, retention_days: u64, today: NaiveDate) -> usize {
  if retention_days == 0 {
    return 0;
  }
  let Some(cutoff) = today.checked_sub_days(chrono::Days::new(retention_days)) else {
    return 0;
  };
  let Ok(entries) = fs::read_dir(log_dir) else {
    return 0;
  };

  entries
    .flatten()
    .filter(|e| rolled_log_date(&e.path()).is_some_and(|d| d < cutoff))
    .filter(|e| fs::remove_file(e.path()).is_ok())
    .count()
}

/// `squat-scan.log.2026-10-18` -> 2026-10-18.
fn rolled_log_date(path: &Path) -> Option<NaiveDate> {
  let name = path.file_name()?.to_str()?;
  let suffix = name.strip_prefix(LOG_FILE_NAME)?.strip_prefix('.')?;
  NaiveDate::parse_from_str(suffix, "%Y-%m-%d").ok()
}
