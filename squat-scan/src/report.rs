use squat_core::record_store::RecordSummary;
use squat_core::types::{total_candidates, AnnotatedMapping, CandidateMapping};
use std::fmt::Write;

/// `0: name` lines.
pub fn render_numbered(names: &[String]) -> String {
  let mut out = String::new();
  for (i, name) in names.iter().enumerate() {
    let _ = writeln!(out, "{i}: {name}");
  }
  out
}

pub fn render_mapping(mapping: &CandidateMapping) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Number of packages to examine: {}", mapping.len());
  for (target, candidates) in mapping {
    let _ = writeln!(out, "{target} : [{}]", candidates.join(", "));
  }
  let _ = writeln!(out, "Number of potential typosquatters: {}", total_candidates(mapping));
  out
}

pub fn render_annotated(mapping: &AnnotatedMapping) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Number of packages to examine: {}", mapping.len());
  let mut total = 0usize;
  for (target, candidates) in mapping {
    total += candidates.len();
    if candidates.is_empty() {
      let _ = writeln!(out, "{target} : []");
      continue;
    }
    let _ = writeln!(out, "{target} :");
    for c in candidates {
      let _ = writeln!(
        out,
        "  {} [{}] identical_fields={}",
        c.name,
        c.risk.as_str(),
        c.identical_fields
      );
    }
  }
  let _ = writeln!(out, "Number of potential typosquatters: {total}");
  out
}

pub fn render_records(records: &[RecordSummary]) -> String {
  if records.is_empty() {
    return "No stored results.\n".to_string();
  }
  let mut out = String::new();
  for r in records {
    let _ = writeln!(
      out,
      "{} targets={} candidates={} {}",
      r.recorded_at.format("%Y-%m-%d %H:%M:%S"),
      r.targets,
      r.candidates,
      r.path.display()
    );
  }
  out
}
