use crate::error::{Result, ScanError};
use crate::types::{total_candidates, CandidateMapping};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};

const RECORD_SUFFIX: &str = "-record.json";
const RECORD_TIMESTAMP_FORMAT: &str = "%d-%b-%Y-%H-%M-%S";

pub fn record_file_name(at: DateTime<Local>) -> String {
  format!("{}{RECORD_SUFFIX}", at.format(RECORD_TIMESTAMP_FORMAT))
}

/// Persist a scan result as `<dir>/DD-Mon-YYYY-HH-MM-SS-record.json`.
pub fn store_squatting_candidates(
  dir: &Path,
  mapping: &CandidateMapping,
  dry_run: bool,
) -> Result<PathBuf> {
  let file_path = dir.join(record_file_name(Local::now()));

  if dry_run {
    tracing::warn!(
      path = %file_path.display(),
      targets = mapping.len(),
      "DRY-RUN: would store scan record"
    );
    return Ok(file_path);
  }

  fs::create_dir_all(dir).map_err(|e| ScanError::io(format!("create {}", dir.display()), e))?;
  let raw = serde_json::to_vec(mapping).map_err(|e| ScanError::json("serialize scan record", e))?;
  write_atomic(&file_path, &raw)?;
  tracing::info!(
    path = %file_path.display(),
    targets = mapping.len(),
    candidates = total_candidates(mapping),
    "scan record stored"
  );
  Ok(file_path)
}

#[derive(Debug, Clone)]
pub struct RecordSummary {
  pub path: PathBuf,
  pub recorded_at: DateTime<Local>,
  pub targets: usize,
  pub candidates: usize,
}

/// Newest records first, by the timestamp in their file name.
pub fn list_recent(dir: &Path, limit: usize) -> Result<Vec<RecordSummary>> {
  if !dir.exists() {
    return Ok(Vec::new());
  }

  let mut dated: Vec<(DateTime<Local>, PathBuf)> = fs::read_dir(dir)
    .map_err(|e| ScanError::io(format!("read {}", dir.display()), e))?
    .flatten()
    .map(|e| e.path())
    .filter_map(|p| record_timestamp(&p).map(|ts| (ts, p)))
    .collect();
  dated.sort_by(|a, b| b.0.cmp(&a.0));

  let mut out = Vec::new();
  for (recorded_at, path) in dated.into_iter().take(limit) {
    let raw = match fs::read(&path) {
      Ok(r) => r,
      Err(_) => continue,
    };
    let mapping: CandidateMapping = match serde_json::from_slice(&raw) {
      Ok(m) => m,
      Err(_) => continue,
    };
    out.push(RecordSummary {
      path,
      recorded_at,
      targets: mapping.len(),
      candidates: total_candidates(&mapping),
    });
  }

  Ok(out)
}

fn record_timestamp(path: &Path) -> Option<DateTime<Local>> {
  let name = path.file_name()?.to_str()?;
  let stamp = name.strip_suffix(RECORD_SUFFIX)?;
  let naive = NaiveDateTime::parse_from_str(stamp, RECORD_TIMESTAMP_FORMAT).ok()?;
  Local.from_local_datetime(&naive).earliest()
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
  let parent = path
    .parent()
    .ok_or_else(|| ScanError::io(format!("{} has no parent", path.display()), std::io::ErrorKind::NotFound.into()))?;

  let tmp = parent.join(format!(
    ".{}.tmp",
    path.file_name().unwrap_or_default().to_string_lossy()
  ));
  fs::write(&tmp, contents).map_err(|e| ScanError::io(format!("write {}", tmp.display()), e))?;
  fs::rename(&tmp, path).map_err(|e| ScanError::io(format!("rename {}", tmp.display()), e))?;
  Ok(())
}
