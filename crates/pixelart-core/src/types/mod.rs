//! Core type definitions shared by the plugin and pipeline crates.

pub mod payload;

pub use payload::Payload;
