use super::schema::{Snapshot, SnapshotEntry, TimestampSource};
use crate::error::{Result, ScanError};
use crate::types::PackageUniverse;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer as _, IgnoredAny, MapAccess, Visitor};
use std::fmt;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "pypi-package-list-";
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";
const FILE_TIMESTAMP_LEN: usize = 19;

/// Append-only directory of universe snapshots. Files are created, read and listed,
/// never modified or removed.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
  dir: PathBuf,
  dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadKind {
  Embedded,
  Legacy,
}

impl SnapshotStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      dir: dir.into(),
      dry_run: false,
    }
  }

  pub fn with_dry_run(mut self, dry_run: bool) -> Self {
    self.dry_run = dry_run;
    self
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn file_name_for(created_at: DateTime<Utc>) -> String {
    format!("{FILE_PREFIX}{}.json", created_at.format(FILE_TIMESTAMP_FORMAT))
  }

  /// Persist `universe` as a new snapshot. Fails rather than replace an existing file.
  pub fn save(&self, universe: &PackageUniverse, created_at: DateTime<Utc>) -> Result<PathBuf> {
    let path = self.dir.join(Self::file_name_for(created_at));

    if self.dry_run {
      tracing::warn!(
        path = %path.display(),
        packages = universe.len(),
        "DRY-RUN: would store package list snapshot"
      );
      return Ok(path);
    }

    fs::create_dir_all(&self.dir)
      .map_err(|e| ScanError::io(format!("create {}", self.dir.display()), e))?;

    let snapshot = Snapshot {
      created_at,
      packages: universe.clone().into_sorted_vec(),
    };
    let bytes = serde_json::to_vec_pretty(&snapshot)
      .map_err(|e| ScanError::json("serialize snapshot", e))?;
    write_new_file(&path, &bytes)?;

    tracing::info!(path = %path.display(), packages = snapshot.packages.len(), "snapshot stored");
    Ok(path)
  }

  /// Every readable snapshot, in no particular order. Files without a usable timestamp
  /// are skipped with a warning.
  pub fn list(&self) -> Result<Vec<SnapshotEntry>> {
    let entries = match fs::read_dir(&self.dir) {
      Ok(e) => e,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(ScanError::io(format!("read {}", self.dir.display()), e)),
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
      let path = entry.path();
      if !is_snapshot_file(&path) {
        continue;
      }
      match read_entry(&path) {
        Ok(e) => out.push(e),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping snapshot"),
      }
    }
    Ok(out)
  }

  pub fn load(&self, entry: &SnapshotEntry) -> Result<Snapshot> {
    let context = format!("read snapshot {}", entry.path.display());
    let mut reader = open(&entry.path)?;
    match payload_kind(&mut reader).map_err(|e| ScanError::io(context.clone(), e))? {
      PayloadKind::Embedded => {
        serde_json::from_reader(reader).map_err(|e| ScanError::json(context, e))
      }
      PayloadKind::Legacy => {
        let packages: Vec<String> =
          serde_json::from_reader(reader).map_err(|e| ScanError::json(context, e))?;
        Ok(Snapshot {
          created_at: entry.created_at,
          packages,
        })
      }
    }
  }
}

fn is_snapshot_file(path: &Path) -> bool {
  let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
    return false;
  };
  !name.starts_with('.') && path.extension().and_then(|e| e.to_str()) == Some("json")
}

fn read_entry(path: &Path) -> Result<SnapshotEntry> {
  let context = format!("read snapshot {}", path.display());
  let mut reader = open(path)?;
  match payload_kind(&mut reader).map_err(|e| ScanError::io(context.clone(), e))? {
    PayloadKind::Embedded => {
      let created_at = read_created_at(reader).map_err(|e| ScanError::json(context, e))?;
      Ok(SnapshotEntry {
        path: path.to_path_buf(),
        created_at,
        source: TimestampSource::Embedded,
      })
    }
    PayloadKind::Legacy => {
      let created_at = timestamp_from_file_name(path).ok_or_else(|| {
        ScanError::MalformedSnapshotName {
          path: path.to_path_buf(),
        }
      })?;
      Ok(SnapshotEntry {
        path: path.to_path_buf(),
        created_at,
        source: TimestampSource::FileName,
      })
    }
  }
}

const HEADER_READ: &str = "created_at read";

/// Walks the top-level object only as far as `created_at`; the rest of the file is
/// neither read nor validated.
fn read_created_at<R: Read>(reader: R) -> std::result::Result<DateTime<Utc>, serde_json::Error> {
  struct CreatedAt<'a>(&'a mut Option<DateTime<Utc>>);

  impl<'de> Visitor<'de> for CreatedAt<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
      f.write_str("a snapshot object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
      while let Some(key) = map.next_key::<String>()? {
        if key == "created_at" {
          *self.0 = Some(map.next_value()?);
          // Abort the parse here; the caller keeps the value.
          return Err(<A::Error as de::Error>::custom(HEADER_READ));
        }
        map.next_value::<IgnoredAny>()?;
      }
      Ok(())
    }
  }

  let mut found = None;
  let mut deserializer = serde_json::Deserializer::from_reader(reader);
  let outcome = (&mut deserializer).deserialize_map(CreatedAt(&mut found));
  match (found, outcome) {
    (Some(created_at), _) => Ok(created_at),
    (None, Err(e)) => Err(e),
    (None, Ok(())) => Err(<serde_json::Error as de::Error>::missing_field("created_at")),
  }
}

/// `...-YYYY-MM-DD-HH-MM-SS.json`, read as UTC.
pub fn timestamp_from_file_name(path: &Path) -> Option<DateTime<Utc>> {
  let stem = path.file_stem()?.to_str()?;
  let tail = stem.get(stem.len().checked_sub(FILE_TIMESTAMP_LEN)?..)?;
  NaiveDateTime::parse_from_str(tail, FILE_TIMESTAMP_FORMAT)
    .ok()
    .map(|naive| naive.and_utc())
}

fn open(path: &Path) -> Result<BufReader<fs::File>> {
  let file =
    fs::File::open(path).map_err(|e| ScanError::io(format!("open {}", path.display()), e))?;
  Ok(BufReader::new(file))
}

/// Peeks at the first non-whitespace byte without consuming the payload.
fn payload_kind(reader: &mut BufReader<fs::File>) -> std::io::Result<PayloadKind> {
  loop {
    let buf = reader.fill_buf()?;
    if buf.is_empty() {
      return Err(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "empty snapshot",
      ));
    }
    let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
    if skip < buf.len() {
      let first = buf[skip];
      reader.consume(skip);
      return match first {
        b'{' => Ok(PayloadKind::Embedded),
        b'[' => Ok(PayloadKind::Legacy),
        other => Err(std::io::Error::new(
          std::io::ErrorKind::InvalidData,
          format!("unexpected leading byte 0x{other:02x}"),
        )),
      };
    }
    reader.consume(skip);
  }
}

/// Writes to a temp file, then hard-links it into place so an existing snapshot is never
/// replaced and readers never see a partial file.
fn write_new_file(dst: &Path, bytes: &[u8]) -> Result<()> {
  let name = dst.file_name().and_then(|s| s.to_str()).unwrap_or("snapshot");
  let tmp = dst.with_file_name(format!(".{name}.tmp"));

  fs::write(&tmp, bytes).map_err(|e| ScanError::io(format!("write {}", tmp.display()), e))?;
  let linked = fs::hard_link(&tmp, dst);
  let _ = fs::remove_file(&tmp);
  linked.map_err(|e| ScanError::io(format!("create {}", dst.display()), e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn ts(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
  }

  #[test]
  fn save_then_list_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let u: PackageUniverse = ["b", "a", "c"].into_iter().collect();
    let at = ts(2026, 10, 17, 8);

    let path = store.save(&u, at).unwrap();
    assert_eq!(
      path.file_name().unwrap().to_str().unwrap(),
      "pypi-package-list-2026-10-17-08-00-00.json"
    );

    let entries = store.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].created_at, at);
    assert_eq!(entries[0].source, TimestampSource::Embedded);

    let snap = store.load(&entries[0]).unwrap();
    assert_eq!(snap.packages, vec!["a", "b", "c"]);
  }

  #[test]
  fn save_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let at = ts(2026, 10, 17, 8);
    store.save(&["a"].into_iter().collect(), at).unwrap();
    assert!(store.save(&["b"].into_iter().collect(), at).is_err());

    let entries = store.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(store.load(&entries[0]).unwrap().packages, vec!["a"]);
  }

  #[test]
  fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("lists")).with_dry_run(true);
    store.save(&["a"].into_iter().collect(), ts(2026, 1, 1, 0)).unwrap();
    assert!(!dir.path().join("lists").exists());
    assert!(store.list().unwrap().is_empty());
  }

  #[test]
  fn legacy_arrays_use_file_name_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("pypi-package-list-2026-10-01-12-30-05.json"),
      "[\n  \"x\",\n  \"y\"\n]",
    )
    .unwrap();

    let store = SnapshotStore::new(dir.path());
    let entries = store.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source, TimestampSource::FileName);
    assert_eq!(
      entries[0].created_at,
      Utc.with_ymd_and_hms(2026, 10, 1, 12, 30, 5).unwrap()
    );
    assert_eq!(store.load(&entries[0]).unwrap().packages, vec!["x", "y"]);
  }

  #[test]
  fn malformed_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pypi-package-list-latest.json"), "[\"x\"]").unwrap();
    fs::write(dir.path().join("garbage.json"), "not json").unwrap();
    fs::write(dir.path().join("empty.json"), "").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    let store = SnapshotStore::new(dir.path());
    store.save(&["ok"].into_iter().collect(), ts(2026, 5, 5, 5)).unwrap();

    let entries = store.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].created_at, ts(2026, 5, 5, 5));
  }

  #[test]
  fn listing_reads_only_the_header() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("pypi-package-list-2020-01-01-00-00-00.json"),
      r#"{"created_at":"2020-01-01T00:00:00Z","packages":["a","b""#,
    )
    .unwrap();
    fs::write(
      dir.path().join("reordered.json"),
      r#"{"packages":["x"],"created_at":"2021-06-01T00:00:00Z"}"#,
    )
    .unwrap();
    fs::write(dir.path().join("headless.json"), r#"{"packages":["x"]}"#).unwrap();

    let store = SnapshotStore::new(dir.path());
    let mut entries = store.list().unwrap();
    entries.sort_by_key(|e| e.created_at);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].created_at, ts(2020, 1, 1, 0));
    assert_eq!(entries[1].created_at, ts(2021, 6, 1, 0));

    assert!(matches!(store.load(&entries[0]), Err(ScanError::Json { .. })));
    assert_eq!(store.load(&entries[1]).unwrap().packages, vec!["x"]);
  }

  #[test]
  fn missing_directory_lists_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("nope"));
    assert!(store.list().unwrap().is_empty());
  }

  #[test]
  fn file_name_parsing() {
    let p = Path::new("package_lists/pypi-package-list-2020-06-01-23-59-59.json");
    assert_eq!(
      timestamp_from_file_name(p),
      Some(Utc.with_ymd_and_hms(2020, 6, 1, 23, 59, 59).unwrap())
    );
    assert_eq!(timestamp_from_file_name(Path::new("x.json")), None);
    assert_eq!(
      timestamp_from_file_name(Path::new("pypi-package-list-2020-13-01-00-00-00.json")),
      None
    );
  }
}
