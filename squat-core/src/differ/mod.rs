//! Recently registered names: diff the current universe against the newest snapshot
//! that is at least one staleness period old, then screen only the new names.

use crate::aggregator::create_suspicious_package_dict;
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::types::{CandidateMapping, PackageName, PackageUniverse};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::path::PathBuf;

pub mod schema;
pub mod store;

pub use schema::{Snapshot, SnapshotEntry, TimestampSource};
pub use store::SnapshotStore;

pub const DEFAULT_STALENESS_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct RecencyReport {
  pub baseline: SnapshotEntry,
  pub saved: Option<PathBuf>,
  pub new_names: Vec<PackageName>,
  pub candidates: CandidateMapping,
}

/// Newest entry created at or before `now - staleness`, whatever order `entries` is in.
/// A staleness reaching past the earliest representable time selects nothing.
pub fn select_baseline(
  entries: &[SnapshotEntry],
  now: DateTime<Utc>,
  staleness: Duration,
) -> Option<&SnapshotEntry> {
  let cutoff = now.checked_sub_signed(staleness)?;
  entries
    .iter()
    .filter(|e| e.created_at <= cutoff)
    .max_by(|a, b| {
      a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.path.cmp(&b.path))
    })
}

/// Names in `current` that the baseline did not record, sorted.
pub fn new_names(current: &PackageUniverse, baseline: &HashSet<PackageName>) -> Vec<PackageName> {
  let mut out: Vec<PackageName> = current
    .iter()
    .filter(|n| !baseline.contains(*n))
    .map(str::to_string)
    .collect();
  out.sort();
  out
}

pub struct RecencyDiffer<'a> {
  store: &'a SnapshotStore,
  scan: &'a ScanConfig,
  staleness: Duration,
}

impl<'a> RecencyDiffer<'a> {
  /// Hours beyond what `Duration` can hold saturate to `Duration::MAX`.
  pub fn new(store: &'a SnapshotStore, scan: &'a ScanConfig, staleness_hours: i64) -> Self {
    Self {
      store,
      scan,
      staleness: Duration::try_hours(staleness_hours).unwrap_or(Duration::MAX),
    }
  }

  /// Optionally snapshot `current`, diff it against the eligible baseline and screen the
  /// new names against all of `current`.
  pub fn run(
    &self,
    current: &PackageUniverse,
    save: bool,
    now: DateTime<Utc>,
  ) -> Result<RecencyReport> {
    let saved = if save {
      Some(self.store.save(current, now)?)
    } else {
      None
    };

    let entries = self.store.list()?;
    let baseline = select_baseline(&entries, now, self.staleness)
      .cloned()
      .ok_or_else(|| ScanError::NoEligibleSnapshot {
        dir: self.store.dir().to_path_buf(),
        staleness_hours: self.staleness.num_hours(),
      })?;

    let snapshot = self.store.load(&baseline)?;
    let recorded: HashSet<PackageName> = snapshot.packages.into_iter().collect();
    let fresh = new_names(current, &recorded);
    tracing::info!(
      baseline = %baseline.path.display(),
      baseline_created_at = %baseline.created_at,
      new_names = fresh.len(),
      "diffed against snapshot"
    );

    let candidates = create_suspicious_package_dict(current, &fresh, self.scan);
    Ok(RecencyReport {
      baseline,
      saved,
      new_names: fresh,
      candidates,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn entry(name: &str, created_at: DateTime<Utc>) -> SnapshotEntry {
    SnapshotEntry {
      path: PathBuf::from(name),
      created_at,
      source: TimestampSource::Embedded,
    }
  }

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
  }

  #[test]
  fn picks_newest_eligible_regardless_of_order() {
    let entries = vec![
      entry("old", now() - Duration::days(10)),
      entry("too-new", now() - Duration::hours(2)),
      entry("best", now() - Duration::hours(30)),
      entry("older", now() - Duration::days(3)),
    ];
    let mut reversed = entries.clone();
    reversed.reverse();

    for list in [&entries, &reversed] {
      let chosen = select_baseline(list, now(), Duration::hours(24)).unwrap();
      assert_eq!(chosen.path, PathBuf::from("best"));
    }
  }

  #[test]
  fn exactly_one_period_old_is_eligible() {
    let entries = vec![entry("edge", now() - Duration::hours(24))];
    assert!(select_baseline(&entries, now(), Duration::hours(24)).is_some());
    let entries = vec![entry("young", now() - Duration::hours(23))];
    assert!(select_baseline(&entries, now(), Duration::hours(24)).is_none());
  }

  #[test]
  fn huge_staleness_selects_nothing() {
    let entries = vec![entry("ancient", now() - Duration::days(36_500))];
    assert!(select_baseline(&entries, now(), Duration::MAX).is_none());
  }

  #[test]
  fn out_of_range_staleness_hours_do_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store
      .save(&["a"].into_iter().collect(), now() - Duration::days(400))
      .unwrap();

    let scan = ScanConfig::default();
    let current: PackageUniverse = ["a", "b"].into_iter().collect();
    let err = RecencyDiffer::new(&store, &scan, 9_000_000_000_000_000)
      .run(&current, false, now())
      .unwrap_err();
    assert!(err.is_no_eligible_snapshot());
  }

  #[test]
  fn new_names_is_set_difference() {
    let current: PackageUniverse = ["a", "b", "c", "d"].into_iter().collect();
    let baseline: HashSet<String> = ["a", "b", "c"].into_iter().map(String::from).collect();
    assert_eq!(new_names(&current, &baseline), vec!["d".to_string()]);
  }

  #[test]
  fn run_diffs_against_old_snapshot_and_screens_new_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store
      .save(&["a", "b", "c", "flask"].into_iter().collect(), now() - Duration::hours(25))
      .unwrap();

    let current: PackageUniverse = ["a", "b", "c", "flask", "flasks"].into_iter().collect();
    let scan = ScanConfig::default();
    let differ = RecencyDiffer::new(&store, &scan, DEFAULT_STALENESS_HOURS);
    let report = differ.run(&current, false, now()).unwrap();

    assert_eq!(report.new_names, vec!["flasks".to_string()]);
    assert_eq!(report.candidates["flasks"], vec!["flask".to_string()]);
    assert!(report.saved.is_none());
  }

  #[test]
  fn saving_does_not_make_the_new_snapshot_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store
      .save(&["a", "b", "c"].into_iter().collect(), now() - Duration::days(2))
      .unwrap();

    let current: PackageUniverse = ["a", "b", "c", "d"].into_iter().collect();
    let scan = ScanConfig::default();
    let report = RecencyDiffer::new(&store, &scan, 24)
      .run(&current, true, now())
      .unwrap();

    assert_eq!(report.new_names, vec!["d".to_string()]);
    assert!(report.saved.unwrap().exists());
    assert_eq!(store.list().unwrap().len(), 2);
  }

  #[test]
  fn no_eligible_snapshot_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let scan = ScanConfig::default();
    let current: PackageUniverse = ["a"].into_iter().collect();

    let err = RecencyDiffer::new(&store, &scan, 24)
      .run(&current, true, now())
      .unwrap_err();
    assert!(err.is_no_eligible_snapshot());
  }
}
