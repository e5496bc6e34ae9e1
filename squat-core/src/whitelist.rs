use crate::error::{Result, ScanError};
use crate::types::{CandidateMapping, PackageName};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Known-good names that must never be reported as suspicious.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
  names: HashSet<PackageName>,
}

impl Whitelist {
  /// One name per line. An unreadable file is an error, never an empty whitelist.
  pub fn load(path: &Path) -> Result<Self> {
    let raw = fs::read_to_string(path).map_err(|source| ScanError::WhitelistUnavailable {
      path: path.to_path_buf(),
      source,
    })?;
    let wl = Self::from_lines(&raw);
    tracing::debug!(path = %path.display(), entries = wl.len(), "whitelist loaded");
    Ok(wl)
  }

  pub fn from_lines(raw: &str) -> Self {
    raw
      .lines()
      .map(|l| l.trim_end_matches('\r'))
      .filter(|l| !l.is_empty())
      .collect()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.names.contains(name)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// Drops whitelisted candidates. Every target key is kept, even with an empty list.
  pub fn apply(&self, mapping: &CandidateMapping) -> CandidateMapping {
    mapping
      .iter()
      .map(|(target, candidates)| {
        let kept = candidates
          .iter()
          .filter(|c| !self.contains(c))
          .cloned()
          .collect();
        (target.clone(), kept)
      })
      .collect()
  }
}

impl<S: Into<PackageName>> FromIterator<S> for Whitelist {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self {
      names: iter.into_iter().map(Into::into).collect(),
    }
  }
}
