//! API surface handed to plugins.

pub mod context;

pub use context::PluginContext;
