use super::{parse_metadata, parse_simple_index, parse_top_packages, RegistryClient, TopNames};
use crate::config::RegistryConfig;
use crate::error::{Result, ScanError};
use crate::risk::MetadataSource;
use crate::types::{MetadataRecord, PackageUniverse};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Url;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

const SIMPLE_INDEX_JSON: &str = "application/vnd.pypi.simple.v1+json";
const MAX_METADATA_BYTES: usize = 8 * 1024 * 1024;

/// Blocking HTTPS client for the registry and the top-packages feed.
pub struct HttpRegistry {
  client: Client,
  cfg: RegistryConfig,
  stored_top_packages: PathBuf,
}

impl HttpRegistry {
  pub fn new(cfg: &RegistryConfig, stored_top_packages: PathBuf) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_seconds))
      .redirect(Policy::limited(5))
      .build()
      .map_err(|e| ScanError::retrieval("build HTTP client", e))?;
    Ok(Self {
      client,
      cfg: cfg.clone(),
      stored_top_packages,
    })
  }

  fn max_response_bytes(&self) -> usize {
    usize::try_from(self.cfg.max_response_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
  }

  fn get(&self, url: &Url, accept: Option<&str>, max_bytes: usize) -> Result<Vec<u8>> {
    validate_endpoint(url)?;
    let mut req = self.client.get(url.clone()).header(
      USER_AGENT,
      format!("squat-scan/{}", env!("CARGO_PKG_VERSION")),
    );
    if let Some(accept) = accept {
      req = req.header(ACCEPT, accept);
    }

    let response = req
      .send()
      .map_err(|e| ScanError::retrieval(format!("GET {}", safe_url_label(url)), e))?;

    if response.status().as_u16() != 200 {
      return Err(ScanError::Retrieval(format!(
        "unexpected HTTP status {} for {}",
        response.status().as_u16(),
        safe_url_label(url)
      )));
    }

    read_response_with_limit(response, max_bytes)
  }
}

impl RegistryClient for HttpRegistry {
  fn fetch_universe(&self) -> Result<PackageUniverse> {
    let url = parse_url(&self.cfg.simple_index_url)?;
    let bytes = self.get(&url, Some(SIMPLE_INDEX_JSON), self.max_response_bytes())?;
    let universe = parse_simple_index(&bytes)?;
    tracing::info!(packages = universe.len(), host = url.host_str().unwrap_or(""), "fetched package universe");
    Ok(universe)
  }

  fn fetch_top_names(&self, n: usize, use_stored: bool) -> Result<TopNames> {
    let bytes = if use_stored {
      fs::read(&self.stored_top_packages).map_err(|e| {
        ScanError::retrieval(
          format!("read stored top packages {}", self.stored_top_packages.display()),
          e,
        )
      })?
    } else {
      let url = parse_url(&self.cfg.top_packages_url)?;
      self.get(&url, None, self.max_response_bytes())?
    };
    let top = parse_top_packages(&bytes, n)?;
    tracing::info!(requested = n, received = top.len(), stored = use_stored, "fetched top packages");
    Ok(top)
  }
}

impl MetadataSource for HttpRegistry {
  fn fetch_metadata(&self, name: &str) -> Result<MetadataRecord> {
    let url = metadata_url(&self.cfg.json_api_url, name)?;
    let bytes = self.get(&url, None, MAX_METADATA_BYTES)?;
    parse_metadata(&bytes)
  }
}

fn parse_url(raw: &str) -> Result<Url> {
  Url::parse(raw).map_err(|e| ScanError::retrieval(format!("invalid URL {raw}"), e))
}

/// `<json_api_url>/<name>/json`
pub fn metadata_url(base: &str, name: &str) -> Result<Url> {
  let mut url = parse_url(base)?;
  url
    .path_segments_mut()
    .map_err(|_| ScanError::Retrieval(format!("URL cannot be a base: {base}")))?
    .pop_if_empty()
    .push(name)
    .push("json");
  Ok(url)
}

fn validate_endpoint(url: &Url) -> Result<()> {
  if url.scheme() != "https" {
    return Err(ScanError::Retrieval(format!(
      "endpoint must use HTTPS: {}",
      safe_url_label(url)
    )));
  }
  if url.host_str().is_none() {
    return Err(ScanError::Retrieval("endpoint host missing".to_string()));
  }
  Ok(())
}

fn read_response_with_limit(response: Response, max_bytes: usize) -> Result<Vec<u8>> {
  let mut out = Vec::new();
  let mut limited = response.take((max_bytes.saturating_add(1)) as u64);
  limited
    .read_to_end(&mut out)
    .map_err(|e| ScanError::retrieval("read response body", e))?;

  if out.len() > max_bytes {
    return Err(ScanError::Retrieval(format!(
      "response exceeds max size {max_bytes} bytes"
    )));
  }

  Ok(out)
}

fn safe_url_label(url: &Url) -> String {
  let host = url.host_str().unwrap_or("<no-host>");
  let mut path = url.path().to_string();
  if path.is_empty() {
    path = "/".to_string();
  }
  format!("{host}{path}")
}
