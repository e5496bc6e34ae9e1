use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "SQUAT_SCAN_HOME";

/// `$SQUAT_SCAN_HOME`, or the working directory.
pub fn base_dir() -> anyhow::Result<PathBuf> {
  if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
    return Ok(PathBuf::from(home));
  }
  Ok(std::env::current_dir()?)
}

pub fn config_path(base: &Path) -> PathBuf {
  base.join("config.toml")
}

pub fn logs_dir(base: &Path) -> PathBuf {
  base.join("logs")
}

pub fn results_dir(base: &Path) -> PathBuf {
  base.join("results")
}

pub fn package_lists_dir(base: &Path) -> PathBuf {
  base.join("package_lists")
}

pub fn whitelist_path(base: &Path) -> PathBuf {
  base.join("whitelist.txt")
}

pub fn stored_top_packages_path(base: &Path) -> PathBuf {
  base.join("top_packages.json")
}
