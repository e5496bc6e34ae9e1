use super::Screen;
use crate::types::{PackageName, PackageUniverse};
use serde::{Deserialize, Serialize};

/// Which word-order/separator forms the confusion screen generates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfusionStrategy {
  /// `a-b` -> `b-a`, `a_b`, `b_a`.
  #[default]
  ThreeWay,
  /// `a-b` -> `b-a` only.
  ReversalOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfusionResult {
  /// The name does not contain exactly one separator.
  NotApplicable,
  Applicable(Vec<PackageName>),
}

impl ConfusionResult {
  pub fn into_candidates(self) -> Vec<PackageName> {
    match self {
      Self::NotApplicable => Vec::new(),
      Self::Applicable(c) => c,
    }
  }

  pub fn is_applicable(&self) -> bool {
    matches!(self, Self::Applicable(_))
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfusionScreen {
  pub strategy: ConfusionStrategy,
}

impl Screen for ConfusionScreen {
  fn name(&self) -> &'static str {
    "confusion"
  }

  fn candidates(&self, name: &str, universe: &PackageUniverse) -> Vec<PackageName> {
    confusion_attack_screen(name, universe, self.strategy).into_candidates()
  }
}

pub fn confusion_attack_screen(
  name: &str,
  universe: &PackageUniverse,
  strategy: ConfusionStrategy,
) -> ConfusionResult {
  let Some((first, sep, second)) = split_once_on_separator(name) else {
    return ConfusionResult::NotApplicable;
  };
  let swapped = if sep == '-' { '_' } else { '-' };

  let forms = match strategy {
    ConfusionStrategy::ThreeWay => vec![
      format!("{second}{sep}{first}"),
      format!("{first}{swapped}{second}"),
      format!("{second}{swapped}{first}"),
    ],
    ConfusionStrategy::ReversalOnly => vec![format!("{second}{sep}{first}")],
  };

  let mut out: Vec<PackageName> = Vec::new();
  for form in forms {
    if form != name && universe.contains(&form) && !out.contains(&form) {
      out.push(form);
    }
  }
  ConfusionResult::Applicable(out)
}

fn split_once_on_separator(name: &str) -> Option<(&str, char, &str)> {
  let mut seps = name.match_indices(['-', '_']);
  let (idx, sep) = seps.next()?;
  if seps.next().is_some() {
    return None;
  }
  let sep = sep.chars().next()?;
  Some((&name[..idx], sep, &name[idx + 1..]))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn universe(names: &[&str]) -> PackageUniverse {
    names.iter().copied().collect()
  }

  #[test]
  fn three_way_finds_all_present_forms() {
    let u = universe(&["cup-joe", "joe-cup", "cup_joe", "joe_cup", "unrelated"]);
    let res = confusion_attack_screen("cup-joe", &u, ConfusionStrategy::ThreeWay);
    assert_eq!(
      res,
      ConfusionResult::Applicable(vec![
        "joe-cup".to_string(),
        "cup_joe".to_string(),
        "joe_cup".to_string(),
      ])
    );
  }

  #[test]
  fn three_way_keeps_only_forms_in_universe() {
    let u = universe(&["python_dateutil", "dateutil-python"]);
    let res = confusion_attack_screen("python_dateutil", &u, ConfusionStrategy::ThreeWay);
    assert_eq!(
      res,
      ConfusionResult::Applicable(vec!["dateutil-python".to_string()])
    );
  }

  #[test]
  fn reversal_only_ignores_separator_swap() {
    let u = universe(&["cup-joe", "cup_joe"]);
    let res = confusion_attack_screen("cup-joe", &u, ConfusionStrategy::ReversalOnly);
    assert_eq!(res, ConfusionResult::Applicable(Vec::new()));
    assert!(res.is_applicable());

    let u = universe(&["cup-joe", "joe-cup"]);
    let res = confusion_attack_screen("cup-joe", &u, ConfusionStrategy::ReversalOnly);
    assert_eq!(res, ConfusionResult::Applicable(vec!["joe-cup".to_string()]));
  }

  #[test]
  fn not_applicable_unless_exactly_one_separator() {
    let u = universe(&["a-b-c", "c-b-a", "ab", "a_b-c"]);
    for strategy in [ConfusionStrategy::ThreeWay, ConfusionStrategy::ReversalOnly] {
      for name in ["ab", "a-b-c", "a_b-c", "a__b", ""] {
        let res = confusion_attack_screen(name, &u, strategy);
        assert_eq!(res, ConfusionResult::NotApplicable, "{name}");
        assert!(!res.is_applicable());
        assert!(res.into_candidates().is_empty());
      }
    }
  }

  #[test]
  fn never_returns_the_target() {
    let u = universe(&["same-same", "same_same"]);
    let res = confusion_attack_screen("same-same", &u, ConfusionStrategy::ThreeWay);
    assert_eq!(res, ConfusionResult::Applicable(vec!["same_same".to_string()]));
  }

  #[test]
  fn edge_separators_produce_empty_segments() {
    let u = universe(&["-lead", "lead-", "lead_"]);
    let res = confusion_attack_screen("-lead", &u, ConfusionStrategy::ThreeWay);
    assert_eq!(
      res,
      ConfusionResult::Applicable(vec!["lead-".to_string(), "lead_".to_string()])
    );
  }
}
