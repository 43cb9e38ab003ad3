//! Compiled-in plugin catalog: module stem → factory.

use std::collections::BTreeMap;
use std::sync::Arc;

use pixelart_core::AppResult;

use crate::api::context::PluginContext;
use crate::traits::Plugin;

/// Builds every plugin type a module provides.
pub type PluginFactory =
    Arc<dyn Fn(&PluginContext) -> AppResult<Vec<Arc<dyn Plugin>>> + Send + Sync>;

/// The closed set of plugin modules linked into the binary.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: BTreeMap<String, PluginFactory>,
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("modules", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory under a module stem, replacing any previous one.
    pub fn register<F>(&mut self, module: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&PluginContext) -> AppResult<Vec<Arc<dyn Plugin>>> + Send + Sync + 'static,
    {
        self.factories.insert(module.into(), Arc::new(factory));
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&PluginContext) -> AppResult<Vec<Arc<dyn Plugin>>> + Send + Sync + 'static,
    {
        self.register(module, factory);
        self
    }

    /// Looks up a module's factory.
    pub fn get(&self, module: &str) -> Option<&PluginFactory> {
        self.factories.get(module)
    }

    /// Whether a module is known.
    pub fn contains(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }

    /// Known module stems, sorted.
    pub fn modules(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
