//! Hook system: entries, the per-capability hook table, and the composer
//! that turns include-lists into pipelines.

pub mod composer;
pub mod definitions;
pub mod registry;
