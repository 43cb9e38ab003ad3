//! # pixelart-plugin
//!
//! Plugin framework for the pixel art engine. Provides:
//!
//! - Plugin contracts per capability (display, cognitive, game)
//! - Module discovery from `*.plugin.toml` manifests and allow-list filtering
//! - A compiled-in catalog mapping module stems to plugin factories
//! - Classification and registration of plugin instances
//! - Requirement consolidation and installation through an external command
//! - Hook composition into the display and cognitive pipelines

pub mod api;
pub mod catalog;
pub mod deps;
pub mod hooks;
pub mod loader;
pub mod manager;
pub mod registry;
pub mod traits;

pub use api::context::PluginContext;
pub use catalog::{PluginCatalog, PluginFactory};
pub use deps::{DependencyInstaller, VersionedPackage};
pub use hooks::composer::{ComposedPipelines, HookComposer, Pipeline, PipelineKind};
pub use hooks::definitions::{HookEntry, HookId};
pub use hooks::registry::HookRegistry;
pub use loader::{ModuleManifest, PluginLoader};
pub use manager::{PluginManager, PluginSet};
pub use registry::{Capability, PluginDescriptor, PluginRegistry};
pub use traits::{CognitivePlugin, DisplayPlugin, GamePlugin, Plugin};
