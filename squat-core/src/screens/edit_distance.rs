use super::Screen;
use crate::types::{PackageName, PackageUniverse};

pub const DEFAULT_MAX_DISTANCE: usize = 1;

/// Misspelling attacks: names within `max_distance` Levenshtein edits of the target.
#[derive(Debug, Clone, Copy)]
pub struct EditDistanceScreen {
  pub max_distance: usize,
}

impl Default for EditDistanceScreen {
  fn default() -> Self {
    Self {
      max_distance: DEFAULT_MAX_DISTANCE,
    }
  }
}

impl Screen for EditDistanceScreen {
  fn name(&self) -> &'static str {
    "edit_distance"
  }

  fn candidates(&self, name: &str, universe: &PackageUniverse) -> Vec<PackageName> {
    distance_calculations(name, universe, self.max_distance)
  }
}

/// All other universe members within `max_distance` of `name`, sorted lexicographically.
pub fn distance_calculations(
  name: &str,
  universe: &PackageUniverse,
  max_distance: usize,
) -> Vec<PackageName> {
  let target: Vec<char> = name.chars().collect();
  let mut out: Vec<PackageName> = universe
    .iter()
    .filter(|other| *other != name)
    .filter(|other| bounded_levenshtein(&target, other, max_distance).is_some())
    .map(str::to_string)
    .collect();
  out.sort();
  out
}

pub fn levenshtein(lhs: &str, rhs: &str) -> usize {
  let lhs: Vec<char> = lhs.chars().collect();
  let rhs: Vec<char> = rhs.chars().collect();

  let mut previous: Vec<usize> = (0..=rhs.len()).collect();
  let mut current = vec![0usize; rhs.len() + 1];
  for (i, l) in lhs.iter().enumerate() {
    current[0] = i + 1;
    for (j, r) in rhs.iter().enumerate() {
      let substitution = previous[j] + usize::from(l != r);
      current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(substitution);
    }
    std::mem::swap(&mut previous, &mut current);
  }
  previous[rhs.len()]
}

/// Distance between `lhs` and `rhs`, or `None` as soon as it must exceed `max_distance`.
fn bounded_levenshtein(lhs: &[char], rhs: &str, max_distance: usize) -> Option<usize> {
  let rhs_len = rhs.chars().count();
  if lhs.len().abs_diff(rhs_len) > max_distance {
    return None;
  }
  let rhs: Vec<char> = rhs.chars().collect();

  let mut previous: Vec<usize> = (0..=rhs_len).collect();
  let mut current = vec![0usize; rhs_len + 1];

  for (i, l) in lhs.iter().enumerate() {
    current[0] = i + 1;
    let mut row_min = current[0];

    for (j, r) in rhs.iter().enumerate() {
      let substitution = previous[j] + usize::from(l != r);
      current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(substitution);
      row_min = row_min.min(current[j + 1]);
    }

    if row_min > max_distance {
      return None;
    }
    std::mem::swap(&mut previous, &mut current);
  }

  let distance = previous[rhs_len];
  (distance <= max_distance).then_some(distance)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn universe(names: &[&str]) -> PackageUniverse {
    names.iter().copied().collect()
  }

  #[test]
  fn finds_single_substitution() {
    let u = universe(&["bat", "apple"]);
    assert_eq!(distance_calculations("cat", &u, 1), vec!["bat".to_string()]);
  }

  #[test]
  fn excludes_the_target_itself() {
    let u = universe(&["requests", "request", "requestz"]);
    let out = distance_calculations("requests", &u, 1);
    assert!(!out.contains(&"requests".to_string()));
    assert_eq!(out, vec!["request".to_string(), "requestz".to_string()]);
  }

  #[test]
  fn output_is_sorted() {
    let u = universe(&["nunpy", "numpi", "mumpy", "numpy-", "xnumpy"]);
    let out = distance_calculations("numpy", &u, 1);
    let mut sorted = out.clone();
    sorted.sort();
    assert_eq!(out, sorted);
    assert_eq!(out.len(), 5);
  }

  #[test]
  fn threshold_is_configurable() {
    let u = universe(&["flask", "flsk", "fask", "flaks"]);
    assert_eq!(distance_calculations("flask", &u, 1), vec!["fask", "flsk"]);
    assert_eq!(
      distance_calculations("flask", &u, 2),
      vec!["fask", "flaks", "flsk"]
    );
  }

  #[test]
  fn distance_is_symmetric() {
    let pairs = [("kitten", "sitting"), ("", "abc"), ("urllib3", "urllib4"), ("a-b", "b-a")];
    for (a, b) in pairs {
      assert_eq!(levenshtein(a, b), levenshtein(b, a));
      let ua = universe(&[a]);
      let ub = universe(&[b]);
      for max in 0..4 {
        assert_eq!(
          distance_calculations(b, &ua, max).is_empty(),
          distance_calculations(a, &ub, max).is_empty()
        );
      }
    }
  }

  #[test]
  fn levenshtein_known_values() {
    assert_eq!(levenshtein("kitten", "sitting"), 3);
    assert_eq!(levenshtein("abc", "abc"), 0);
    assert_eq!(levenshtein("", "abc"), 3);
    assert_eq!(levenshtein("flaw", "lawn"), 2);
  }

  #[test]
  fn bounded_agrees_with_full_distance() {
    let words = ["django", "djang0", "dj4ngo", "jango", "djangoo", "dgango", "flask"];
    for a in words {
      let chars: Vec<char> = a.chars().collect();
      for b in words {
        let full = levenshtein(a, b);
        for max in 0..4 {
          assert_eq!(bounded_levenshtein(&chars, b, max), (full <= max).then_some(full));
        }
      }
    }
  }
}
