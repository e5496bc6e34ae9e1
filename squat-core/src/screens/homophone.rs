use super::metaphone::metaphone;
use super::Screen;
use crate::types::{PackageName, PackageUniverse};

/// Sound-alike attacks (`klumpz` for `clumps`): exact metaphone-code match only.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomophoneScreen;

impl Screen for HomophoneScreen {
  fn name(&self) -> &'static str {
    "homophone"
  }

  fn candidates(&self, name: &str, universe: &PackageUniverse) -> Vec<PackageName> {
    homophone_attack_screen(name, universe)
  }
}

/// Other universe members that encode to the same metaphone code as `name`, sorted.
/// A name with an empty code (no letters) matches nothing.
pub fn homophone_attack_screen(name: &str, universe: &PackageUniverse) -> Vec<PackageName> {
  let code = metaphone(name);
  if code.is_empty() {
    return Vec::new();
  }

  let mut out: Vec<PackageName> = universe
    .iter()
    .filter(|other| *other != name)
    .filter(|other| metaphone(other) == code)
    .map(str::to_string)
    .collect();
  out.sort();
  out
}
