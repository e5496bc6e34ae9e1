use crate::config::ScanConfig;
use crate::screens::{confusion_attack_screen, distance_calculations, homophone_attack_screen};
use crate::types::{CandidateMapping, PackageName, PackageUniverse};
use rayon::prelude::*;

/// Screen every target against `universe` and collect suspicious names per target.
///
/// Candidates are edit-distance matches followed by confusion-attack matches, plus
/// homophones when `cfg.homophones` is set, with duplicates dropped. Output keys follow
/// the order of `targets`; targets are screened in parallel and merged by index.
pub fn create_suspicious_package_dict(
  universe: &PackageUniverse,
  targets: &[PackageName],
  cfg: &ScanConfig,
) -> CandidateMapping {
  let per_target: Vec<(PackageName, Vec<PackageName>)> = targets
    .par_iter()
    .map(|target| (target.clone(), screen_target(universe, target, cfg)))
    .collect();

  let mut out = CandidateMapping::with_capacity(per_target.len());
  for (target, candidates) in per_target {
    tracing::debug!(target = %target, candidates = candidates.len(), "screened");
    out.insert(target, candidates);
  }
  out
}

fn screen_target(universe: &PackageUniverse, target: &str, cfg: &ScanConfig) -> Vec<PackageName> {
  let mut candidates = distance_calculations(target, universe, cfg.max_distance);
  let confusion = confusion_attack_screen(target, universe, cfg.confusion_strategy);
  if !confusion.is_applicable() {
    tracing::trace!(target = %target, "confusion screen skipped, not exactly one separator");
  }
  extend_unique(&mut candidates, confusion.into_candidates());
  if cfg.homophones {
    extend_unique(&mut candidates, homophone_attack_screen(target, universe));
  }
  candidates
}

fn extend_unique(into: &mut Vec<PackageName>, more: Vec<PackageName>) {
  for name in more {
    if !into.contains(&name) {
      into.push(name);
    }
  }
}

/// Names with at least `min_len` characters, order preserved.
pub fn filter_by_package_name_len<S: AsRef<str>>(names: &[S], min_len: usize) -> Vec<PackageName> {
  names
    .iter()
    .map(|n| n.as_ref())
    .filter(|n: &&str| n.chars().count() >= min_len)
    .map(str::to_string)
    .collect()
}
