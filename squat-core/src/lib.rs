//! Typosquatting detection for package registries: similarity screens over a name
//! universe, whitelist filtering, metadata risk scoring and snapshot diffs of newly
//! registered names.

pub mod aggregator;
pub mod config;
pub mod differ;
pub mod error;
pub mod logging;
pub mod mutation;
pub mod paths;
pub mod record_store;
pub mod registry;
pub mod risk;
pub mod screens;
pub mod types;
pub mod whitelist;

pub use error::{Result, ScanError};
pub use types::{CandidateMapping, PackageName, PackageUniverse};
