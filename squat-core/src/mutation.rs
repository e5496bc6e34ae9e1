//! Defensive name generation: likely fat-finger variants of a name, whether or not
//! anyone has registered them yet.

use crate::types::PackageName;
use std::collections::BTreeSet;

const QWERTY_ROWS: [&str; 4] = ["1234567890", "qwertyuiop", "asdfghjkl", "zxcvbnm"];

/// Keys immediately left and right of `c` on its QWERTY row. Case follows `c`.
pub fn adjacent_keys(c: char) -> Vec<char> {
  let lower = c.to_ascii_lowercase();
  for row in QWERTY_ROWS {
    let keys: Vec<char> = row.chars().collect();
    let Some(pos) = keys.iter().position(|k| *k == lower) else {
      continue;
    };

    let mut out = Vec::with_capacity(2);
    if pos > 0 {
      out.push(keys[pos - 1]);
    }
    if let Some(right) = keys.get(pos + 1) {
      out.push(*right);
    }
    if c.is_ascii_uppercase() {
      out.iter_mut().for_each(|k| *k = k.to_ascii_uppercase());
    }
    return out;
  }
  Vec::new()
}

/// Every name reachable by replacing exactly one character with a neighbouring key.
pub fn create_potential_squatter_names(name: &str) -> BTreeSet<PackageName> {
  let chars: Vec<char> = name.chars().collect();
  let mut out = BTreeSet::new();

  for (i, c) in chars.iter().enumerate() {
    for replacement in adjacent_keys(*c) {
      let mut variant = chars.clone();
      variant[i] = replacement;
      out.insert(variant.into_iter().collect::<String>());
    }
  }

  out.remove(name);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_yields_known_variants() {
    let expected: BTreeSet<String> = ["tedt", "trst", "tesy", "tesr", "rest", "teat", "twst", "yest"]
      .into_iter()
      .map(String::from)
      .collect();
    assert_eq!(create_potential_squatter_names("test"), expected);
  }

  #[test]
  fn variants_keep_length_and_differ_by_one_char() {
    let name = "requests-oauthlib";
    let variants = create_potential_squatter_names(name);
    assert!(!variants.is_empty());
    for v in &variants {
      assert_eq!(v.chars().count(), name.chars().count());
      let diffs = v.chars().zip(name.chars()).filter(|(a, b)| a != b).count();
      assert_eq!(diffs, 1, "{v}");
    }
  }

  #[test]
  fn row_edges_have_one_neighbour() {
    assert_eq!(adjacent_keys('q'), vec!['w']);
    assert_eq!(adjacent_keys('p'), vec!['o']);
    assert_eq!(adjacent_keys('m'), vec!['n']);
    assert_eq!(adjacent_keys('0'), vec!['9']);
    assert_eq!(adjacent_keys('G'), vec!['F', 'H']);
    assert!(adjacent_keys('-').is_empty());
    assert!(adjacent_keys('_').is_empty());
  }

  #[test]
  fn is_deterministic() {
    assert_eq!(
      create_potential_squatter_names("django"),
      create_potential_squatter_names("django")
    );
    assert!(create_potential_squatter_names("").is_empty());
    assert!(create_potential_squatter_names("--").is_empty());
  }
}
