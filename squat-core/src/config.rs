use crate::screens::{ConfusionStrategy, DEFAULT_MAX_DISTANCE};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct Config {
  pub scan: ScanConfig,
  pub logging: LoggingConfig,
  pub registry: RegistryConfig,
  pub snapshots: SnapshotConfig,
  /// Values in config.toml that were rejected and replaced by defaults. Reported once
  /// logging is up.
  pub warnings: Vec<String>,
}

/// Thresholds handed to every screening call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
  #[serde(default = "default_max_distance")]
  pub max_distance: usize,

  #[serde(default = "default_top_n")]
  pub top_n: usize,

  #[serde(default = "default_min_len")]
  pub min_len: usize,

  #[serde(default)]
  pub confusion_strategy: ConfusionStrategy,

  #[serde(default)]
  pub homophones: bool,
}

impl Default for ScanConfig {
  fn default() -> Self {
    Self {
      max_distance: default_max_distance(),
      top_n: default_top_n(),
      min_len: default_min_len(),
      confusion_strategy: ConfusionStrategy::default(),
      homophones: false,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
  #[serde(default = "default_log_level")]
  pub level: String,

  #[serde(default = "default_retention_days")]
  pub retention_days: u64,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      retention_days: default_retention_days(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
  #[serde(default = "default_simple_index_url")]
  pub simple_index_url: String,

  #[serde(default = "default_top_packages_url")]
  pub top_packages_url: String,

  #[serde(default = "default_json_api_url")]
  pub json_api_url: String,

  #[serde(default = "default_timeout_seconds")]
  pub timeout_seconds: u64,

  #[serde(default = "default_max_response_mb")]
  pub max_response_mb: u64,
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      simple_index_url: default_simple_index_url(),
      top_packages_url: default_top_packages_url(),
      json_api_url: default_json_api_url(),
      timeout_seconds: default_timeout_seconds(),
      max_response_mb: default_max_response_mb(),
    }
  }
}

/// Ten years; anything longer cannot select a baseline in practice.
pub const MAX_STALENESS_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
  #[serde(default = "default_staleness_hours")]
  pub staleness_hours: i64,
}

impl Default for SnapshotConfig {
  fn default() -> Self {
    Self {
      staleness_hours: default_staleness_hours(),
    }
  }
}

fn default_max_distance() -> usize {
  DEFAULT_MAX_DISTANCE
}

fn default_top_n() -> usize {
  50
}

fn default_min_len() -> usize {
  5
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_retention_days() -> u64 {
  14
}

fn default_simple_index_url() -> String {
  "https://pypi.org/simple/".to_string()
}

fn default_top_packages_url() -> String {
  "https://hugovk.github.io/top-pypi-packages/top-pypi-packages-30-days.json".to_string()
}

fn default_json_api_url() -> String {
  "https://pypi.org/pypi/".to_string()
}

fn default_timeout_seconds() -> u64 {
  60
}

fn default_max_response_mb() -> u64 {
  256
}

fn default_staleness_hours() -> i64 {
  24
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
  #[serde(default)]
  pub scan: Option<ScanConfig>,

  #[serde(default)]
  pub logging: Option<LoggingConfig>,

  #[serde(default)]
  pub registry: Option<RegistryConfig>,

  #[serde(default)]
  pub snapshots: Option<SnapshotConfig>,
}

impl ConfigFile {
  fn normalize(self) -> Config {
    let mut cfg = Config::default();
    if let Some(s) = self.scan {
      cfg.scan = s;
    }
    if let Some(l) = self.logging {
      cfg.logging = l;
    }
    if let Some(r) = self.registry {
      cfg.registry = r;
    }
    if let Some(s) = self.snapshots {
      cfg.snapshots = s;
    }

    if let Some(reason) = validate_scan_config(&cfg.scan) {
      cfg.warnings.push(format!("[scan] {reason}; using defaults"));
      cfg.scan = ScanConfig::default();
    }
    if let Some(reason) = validate_registry_config(&cfg.registry) {
      cfg.warnings.push(format!("[registry] {reason}; using defaults"));
      cfg.registry = RegistryConfig::default();
    }
    if let Some(reason) = validate_snapshot_config(&cfg.snapshots) {
      cfg.warnings.push(format!("[snapshots] {reason}; using defaults"));
      cfg.snapshots = SnapshotConfig::default();
    }

    cfg
  }

  fn needs_upgrade(&self) -> bool {
    self.scan.is_none()
      || self.logging.is_none()
      || self.registry.is_none()
      || self.snapshots.is_none()
  }
}

pub fn load_or_create_default(path: &Path) -> anyhow::Result<Config> {
  load(path, true)
}

/// Never writes; used by `--dry-run`.
pub fn load_or_default_readonly(path: &Path) -> anyhow::Result<Config> {
  load(path, false)
}

enum OnDisk {
  Missing,
  Parsed(ConfigFile),
  Invalid(toml::de::Error),
}

fn read(path: &Path) -> anyhow::Result<OnDisk> {
  if !path.exists() {
    return Ok(OnDisk::Missing);
  }
  let raw = fs::read_to_string(path)?;
  Ok(match toml::from_str::<ConfigFile>(&raw) {
    Ok(file) => OnDisk::Parsed(file),
    Err(e) => OnDisk::Invalid(e),
  })
}

fn load(path: &Path, allow_writes: bool) -> anyhow::Result<Config> {
  let dir = path
    .parent()
    .ok_or_else(|| anyhow::anyhow!("config path has no parent: {}", path.display()))?;

  match read(path)? {
    OnDisk::Missing => {
      let cfg = Config::default();
      if allow_writes {
        fs::create_dir_all(dir)?;
        write_atomic(path, &render(&cfg)?)?;
      } else {
        eprintln!("squat-scan: no config at {}; defaults in use", path.display());
      }
      Ok(cfg)
    }
    OnDisk::Parsed(file) => {
      let upgrade = file.needs_upgrade();
      let cfg = file.normalize();
      if upgrade && allow_writes {
        let backup = backup_path(dir, "bak");
        let _ = fs::copy(path, &backup);
        write_atomic(path, &render(&cfg)?)?;
        eprintln!(
          "squat-scan: filled in missing config sections at {} (previous copy: {})",
          path.display(),
          backup.display()
        );
      }
      Ok(cfg)
    }
    OnDisk::Invalid(e) => {
      if allow_writes {
        let backup = backup_path(dir, "bad");
        fs::rename(path, &backup)?;
        write_atomic(path, &render(&Config::default())?)?;
        eprintln!(
          "squat-scan: unreadable config moved to {}; defaults written: {e}",
          backup.display()
        );
      } else {
        eprintln!("squat-scan: unreadable config at {}; defaults in use: {e}", path.display());
      }
      Ok(Config::default())
    }
  }
}

fn render(cfg: &Config) -> anyhow::Result<String> {
  let file = ConfigFile {
    scan: Some(cfg.scan.clone()),
    logging: Some(cfg.logging.clone()),
    registry: Some(cfg.registry.clone()),
    snapshots: Some(cfg.snapshots.clone()),
  };
  Ok(toml::to_string_pretty(&file)?)
}

/// `config.toml.<tag>-YYYYMMDD-HHMMSS`
fn backup_path(dir: &Path, tag: &str) -> PathBuf {
  dir.join(format!("config.toml.{tag}-{}", Local::now().format("%Y%m%d-%H%M%S")))
}

fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
  let tmp = path.with_extension("toml.tmp");
  fs::write(&tmp, contents)?;
  fs::rename(&tmp, path)?;
  Ok(())
}

fn validate_scan_config(cfg: &ScanConfig) -> Option<String> {
  if cfg.top_n == 0 {
    return Some("top_n must be > 0".to_string());
  }
  None
}

fn validate_snapshot_config(cfg: &SnapshotConfig) -> Option<String> {
  let h = cfg.staleness_hours;
  if !(1..=MAX_STALENESS_HOURS).contains(&h) {
    return Some(format!(
      "staleness_hours must be between 1 and {MAX_STALENESS_HOURS}, got {h}"
    ));
  }
  None
}

fn validate_registry_config(cfg: &RegistryConfig) -> Option<String> {
  if cfg.timeout_seconds == 0 {
    return Some("timeout_seconds must be > 0".to_string());
  }
  if cfg.max_response_mb == 0 {
    return Some("max_response_mb must be > 0".to_string());
  }

  for url in [
    &cfg.simple_index_url,
    &cfg.top_packages_url,
    &cfg.json_api_url,
  ] {
    let Ok(parsed) = reqwest::Url::parse(url) else {
      return Some(format!("invalid URL: {url}"));
    };
    if parsed.scheme() != "https" {
      return Some(format!("URL must use HTTPS: {url}"));
    }
    if parsed.host_str().is_none() {
      return Some(format!("URL has no host: {url}"));
    }
  }

  None
}
