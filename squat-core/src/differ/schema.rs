use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted copy of the package universe. `created_at` is written first so that
/// listing stops reading before `packages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
  pub created_at: DateTime<Utc>,
  pub packages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
  /// `created_at` field inside the payload.
  Embedded,
  /// Legacy bare-array payload; timestamp parsed from the file name.
  FileName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
  pub path: PathBuf,
  pub created_at: DateTime<Utc>,
  pub source: TimestampSource,
}
