use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
  /// Universe, top-name feed or metadata could not be obtained. Never retried here.
  #[error("retrieval failed: {0}")]
  Retrieval(String),

  #[error("whitelist unavailable at {path}: {source}")]
  WhitelistUnavailable {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("no snapshot at least {staleness_hours}h old in {dir}; nothing to compare yet")]
  NoEligibleSnapshot { dir: PathBuf, staleness_hours: i64 },

  #[error("snapshot {path} carries no parseable timestamp")]
  MalformedSnapshotName { path: PathBuf },

  #[error("{context}: {source}")]
  Io {
    context: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{context}: {source}")]
  Json {
    context: String,
    #[source]
    source: serde_json::Error,
  },
}

impl ScanError {
  pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
    Self::Io {
      context: context.into(),
      source,
    }
  }

  pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
    Self::Json {
      context: context.into(),
      source,
    }
  }

  pub fn retrieval(what: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
    Self::Retrieval(format!("{what}: {err}"))
  }

  pub fn is_no_eligible_snapshot(&self) -> bool {
    matches!(self, Self::NoEligibleSnapshot { .. })
  }
}

pub type Result<T> = std::result::Result<T, ScanError>;
