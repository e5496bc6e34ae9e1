//! Outside sources: the full name universe, the ranked top-package feed and per-package
//! metadata. Nothing here retries; failures surface as `ScanError::Retrieval`.

use crate::error::{Result, ScanError};
use crate::types::{MetadataRecord, PackageName, PackageUniverse};
use indexmap::IndexMap;

pub mod fetch;
pub mod schema;

pub use fetch::HttpRegistry;

use schema::{PackageJson, SimpleIndex, TopPackagesFeed};

/// Package name -> 1-based download rank, in rank order.
pub type TopNames = IndexMap<PackageName, usize>;

pub trait RegistryClient {
  fn fetch_universe(&self) -> Result<PackageUniverse>;

  fn fetch_top_names(&self, n: usize, use_stored: bool) -> Result<TopNames>;
}

pub fn parse_simple_index(bytes: &[u8]) -> Result<PackageUniverse> {
  let index: SimpleIndex =
    serde_json::from_slice(bytes).map_err(|e| ScanError::retrieval("parse simple index", e))?;
  Ok(index.projects.into_iter().map(|p| p.name).collect())
}

/// First `n` rows of the feed; fewer when the feed is shorter.
pub fn parse_top_packages(bytes: &[u8], n: usize) -> Result<TopNames> {
  let feed: TopPackagesFeed = serde_json::from_slice(bytes)
    .map_err(|e| ScanError::retrieval("parse top packages feed", e))?;
  if let Some(updated) = feed.last_update.as_deref() {
    tracing::debug!(last_update = %updated, rows = feed.rows.len(), "top packages feed");
  }

  let mut out = TopNames::with_capacity(n.min(feed.rows.len()));
  for (i, row) in feed.rows.into_iter().take(n).enumerate() {
    out.entry(row.project).or_insert(i + 1);
  }
  Ok(out)
}

pub fn parse_metadata(bytes: &[u8]) -> Result<MetadataRecord> {
  let doc: PackageJson =
    serde_json::from_slice(bytes).map_err(|e| ScanError::retrieval("parse package JSON", e))?;
  let info = doc.info;
  let canonical_url = if info.project_url.is_empty() {
    info.package_url
  } else {
    info.project_url
  };
  Ok(MetadataRecord {
    author: info.author,
    author_email: info.author_email,
    canonical_url,
    description: info.description,
    home_page: info.home_page,
    summary: info.summary,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn simple_index_names() {
    let raw = br#"{"meta":{"api-version":"1.1"},"projects":[{"name":"requests","_last-serial":1},{"name":"numpy"}]}"#;
    let u = parse_simple_index(raw).unwrap();
    assert_eq!(u.len(), 2);
    assert!(u.contains("requests"));
    assert!(u.contains("numpy"));
  }

  #[test]
  fn top_packages_are_ranked_from_one() {
    let raw = br#"{"last_update":"2026-10-01 00:00:00","rows":[
      {"project":"boto3","download_count":10},
      {"project":"urllib3","download_count":9},
      {"project":"requests","download_count":8}]}"#;
    let top = parse_top_packages(raw, 2).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top.get_index(0), Some((&"boto3".to_string(), &1)));
    assert_eq!(top["urllib3"], 2);

    let all = parse_top_packages(raw, 100).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all["requests"], 3);
  }

  #[test]
  fn metadata_nulls_become_empty() {
    let raw = br#"{"info":{"author":"Kenneth Reitz","author_email":null,
      "project_url":"https://pypi.org/project/requests/","summary":"HTTP",
      "home_page":null}}"#;
    let m = parse_metadata(raw).unwrap();
    assert_eq!(m.author, "Kenneth Reitz");
    assert_eq!(m.author_email, "");
    assert_eq!(m.canonical_url, "https://pypi.org/project/requests/");
    assert_eq!(m.description, "");
    assert_eq!(m.home_page, "");
  }

  #[test]
  fn bad_payload_is_retrieval_error() {
    assert!(matches!(parse_simple_index(b"<html>"), Err(ScanError::Retrieval(_))));
    assert!(matches!(parse_top_packages(b"{}", 5), Err(ScanError::Retrieval(_))));
  }
}
