//! Plugin requirement manifests: parsing, consolidation, installation.

pub mod consolidator;
pub mod installer;
pub mod requirement;

pub use consolidator::consolidate;
pub use installer::{CommandInstaller, DependencyInstaller, NoopInstaller};
pub use requirement::{RequirementError, Version, VersionedPackage, parse_requirements};
