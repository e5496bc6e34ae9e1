mod confusion;
mod edit_distance;
mod homophone;
pub mod metaphone;

pub use confusion::{confusion_attack_screen, ConfusionResult, ConfusionScreen, ConfusionStrategy};
pub use edit_distance::{distance_calculations, levenshtein, EditDistanceScreen, DEFAULT_MAX_DISTANCE};
pub use homophone::{homophone_attack_screen, HomophoneScreen};

use crate::types::{PackageName, PackageUniverse};

/// One attacker model: names in `universe` prone to confusion with `name`.
///
/// Implementations never return `name` itself, even when it is in `universe`.
pub trait Screen: Send + Sync {
  fn name(&self) -> &'static str;

  fn candidates(&self, name: &str, universe: &PackageUniverse) -> Vec<PackageName>;
}
