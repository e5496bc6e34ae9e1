use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type PackageName = String;

/// Target name -> suspicious names, in the order targets were screened.
pub type CandidateMapping = IndexMap<PackageName, Vec<PackageName>>;

/// Every package name known to the registry for the duration of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageUniverse {
  names: HashSet<PackageName>,
}

impl PackageUniverse {
  pub fn new(names: HashSet<PackageName>) -> Self {
    Self { names }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.names.contains(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(|s| s.as_str())
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn into_sorted_vec(self) -> Vec<PackageName> {
    let mut out: Vec<_> = self.names.into_iter().collect();
    out.sort();
    out
  }
}

impl<S: Into<PackageName>> FromIterator<S> for PackageUniverse {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self {
      names: iter.into_iter().map(Into::into).collect(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
  NoRisk,
  SomeRisk,
}

impl RiskLabel {
  pub fn from_identical_fields(count: usize) -> Self {
    if count >= 1 {
      Self::SomeRisk
    } else {
      Self::NoRisk
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NoRisk => "no_risk",
      Self::SomeRisk => "some_risk",
    }
  }
}

/// Published metadata of one package. Absent upstream values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
  pub author: String,
  pub author_email: String,
  pub canonical_url: String,
  pub description: String,
  pub home_page: String,
  pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedCandidate {
  pub name: PackageName,
  pub risk: RiskLabel,
  pub identical_fields: usize,
}

pub type AnnotatedMapping = IndexMap<PackageName, Vec<AnnotatedCandidate>>;

pub fn total_candidates(mapping: &CandidateMapping) -> usize {
  mapping.values().map(Vec::len).sum()
}
