use serde::{Deserialize, Deserializer};

/// PEP 691 JSON form of the simple index.
#[derive(Debug, Clone, Deserialize)]
pub struct SimpleIndex {
  pub projects: Vec<SimpleProject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleProject {
  pub name: String,
}

/// Download-ranked feed; rows are already in rank order.
#[derive(Debug, Clone, Deserialize)]
pub struct TopPackagesFeed {
  #[serde(default)]
  pub last_update: Option<String>,
  pub rows: Vec<TopPackageRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopPackageRow {
  pub project: String,
  #[serde(default)]
  pub download_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageJson {
  pub info: PackageInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageInfo {
  #[serde(default, deserialize_with = "null_as_empty")]
  pub author: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub author_email: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub project_url: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub package_url: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub description: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub home_page: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub summary: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
