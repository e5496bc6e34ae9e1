use crate::error::Result;
use crate::types::{
  AnnotatedCandidate, AnnotatedMapping, CandidateMapping, MetadataRecord, RiskLabel,
};
use std::collections::HashMap;

/// Looks up published metadata for a package.
pub trait MetadataSource {
  fn fetch_metadata(&self, name: &str) -> Result<MetadataRecord>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
  pub identical_fields: usize,
  pub label: RiskLabel,
}

fn compared_fields(m: &MetadataRecord) -> [&str; 6] {
  [
    m.author_email.as_str(),
    m.author.as_str(),
    m.canonical_url.as_str(),
    m.description.as_str(),
    m.home_page.as_str(),
    m.summary.as_str(),
  ]
}

/// Fields that are non-empty on both sides and equal.
pub fn compare_metadata(a: &MetadataRecord, b: &MetadataRecord) -> usize {
  compared_fields(a)
    .into_iter()
    .zip(compared_fields(b))
    .filter(|(x, y)| !x.is_empty() && !y.is_empty() && x == y)
    .count()
}

pub fn assess(a: &MetadataRecord, b: &MetadataRecord) -> RiskAssessment {
  let identical_fields = compare_metadata(a, b);
  RiskAssessment {
    identical_fields,
    label: RiskLabel::from_identical_fields(identical_fields),
  }
}

pub fn score_pair(source: &dyn MetadataSource, a: &str, b: &str) -> Result<RiskAssessment> {
  let ma = source.fetch_metadata(a)?;
  let mb = source.fetch_metadata(b)?;
  Ok(assess(&ma, &mb))
}

/// Label every candidate with its metadata risk against its target. Nothing is removed.
///
/// Each name is looked up at most once per call. Lookup failures propagate.
pub fn annotate(mapping: &CandidateMapping, source: &dyn MetadataSource) -> Result<AnnotatedMapping> {
  let mut cache: HashMap<String, MetadataRecord> = HashMap::new();
  let mut lookup = |name: &str| -> Result<MetadataRecord> {
    if let Some(m) = cache.get(name) {
      return Ok(m.clone());
    }
    let m = source.fetch_metadata(name)?;
    cache.insert(name.to_string(), m.clone());
    Ok(m)
  };

  let mut out = AnnotatedMapping::with_capacity(mapping.len());
  for (target, candidates) in mapping {
    let mut annotated = Vec::with_capacity(candidates.len());
    if !candidates.is_empty() {
      let target_meta = lookup(target.as_str())?;
      for candidate in candidates {
        let assessment = assess(&target_meta, &lookup(candidate.as_str())?);
        annotated.push(AnnotatedCandidate {
          name: candidate.clone(),
          risk: assessment.label,
          identical_fields: assessment.identical_fields,
        });
      }
    }
    out.insert(target.clone(), annotated);
  }
  Ok(out)
}
