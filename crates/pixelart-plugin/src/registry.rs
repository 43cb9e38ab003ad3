//! Plugin registry — stores loaded plugin instances and their descriptors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use pixelart_core::{AppError, AppResult};

use crate::deps::VersionedPackage;
use crate::hooks::definitions::HookEntry;
use crate::hooks::registry::HookRegistry;
use crate::traits::Plugin;

/// Which pipeline group a plugin's hooks belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Renders to the panel.
    Display,
    /// Perception, AI, or content generation.
    Cognitive,
    /// Interactive game streaming frames.
    Game,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display => write!(f, "display"),
            Self::Cognitive => write!(f, "cognitive"),
            Self::Game => write!(f, "game"),
        }
    }
}

/// Metadata about a loaded plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique id, `module.TypeName`.
    pub id: String,
    /// Module stem the plugin came from.
    pub module: String,
    /// Plugin type name.
    pub type_name: String,
    /// Resolved capability.
    pub capability: Capability,
    /// Requirements declared next to the module manifest.
    pub dependencies: Vec<VersionedPackage>,
    /// Hook ids this plugin exposes.
    pub hooks: Vec<String>,
}

#[derive(Debug)]
struct RegisteredPlugin {
    descriptor: PluginDescriptor,
    instance: Arc<dyn Plugin>,
}

/// Registry of all loaded plugins, in load order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<RegisteredPlugin>,
    index: HashMap<String, usize>,
    hooks: HookRegistry,
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin and its hooks.
    ///
    /// Fails if a plugin with the same id is already registered.
    pub fn register(
        &mut self,
        descriptor: PluginDescriptor,
        instance: Arc<dyn Plugin>,
        hooks: Vec<HookEntry>,
    ) -> AppResult<()> {
        if self.index.contains_key(&descriptor.id) {
            return Err(AppError::plugin(format!(
                "Plugin '{}' is already registered",
                descriptor.id
            )));
        }

        info!(
            plugin_id = %descriptor.id,
            capability = %descriptor.capability,
            hooks = hooks.len(),
            "Registering plugin"
        );

        for entry in hooks {
            self.hooks.register(entry);
        }
        self.index.insert(descriptor.id.clone(), self.plugins.len());
        self.plugins.push(RegisteredPlugin {
            descriptor,
            instance,
        });
        Ok(())
    }

    /// Gets a plugin instance by id.
    pub fn get(&self, plugin_id: &str) -> Option<Arc<dyn Plugin>> {
        self.index
            .get(plugin_id)
            .map(|&i| Arc::clone(&self.plugins[i].instance))
    }

    /// Gets a descriptor by id.
    pub fn descriptor(&self, plugin_id: &str) -> Option<&PluginDescriptor> {
        self.index.get(plugin_id).map(|&i| &self.plugins[i].descriptor)
    }

    /// All descriptors, in load order.
    pub fn descriptors(&self) -> Vec<&PluginDescriptor> {
        self.plugins.iter().map(|p| &p.descriptor).collect()
    }

    /// Descriptors of one capability, in load order.
    pub fn by_capability(&self, capability: Capability) -> Vec<&PluginDescriptor> {
        self.plugins
            .iter()
            .map(|p| &p.descriptor)
            .filter(|d| d.capability == capability)
            .collect()
    }

    /// The hook table built from every registered plugin.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Returns plugin count.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Checks whether a plugin is registered.
    pub fn contains(&self, plugin_id: &str) -> bool {
        self.index.contains_key(plugin_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy;

    impl Plugin for Dummy {
        fn type_name(&self) -> &str {
            "Dummy"
        }
    }

    fn descriptor(id: &str, capability: Capability) -> PluginDescriptor {
        PluginDescriptor {
            id: id.to_string(),
            module: "dummy".to_string(),
            type_name: "Dummy".to_string(),
            capability,
            dependencies: Vec::new(),
            hooks: Vec::new(),
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = PluginRegistry::new();
        registry
            .register(descriptor("dummy.Dummy", Capability::Display), Arc::new(Dummy), Vec::new())
            .unwrap();
        let err = registry
            .register(descriptor("dummy.Dummy", Capability::Display), Arc::new(Dummy), Vec::new())
            .unwrap_err();
        assert!(err.is(pixelart_core::ErrorKind::Plugin));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_and_capability_filter() {
        let mut registry = PluginRegistry::new();
        registry
            .register(descriptor("a.A", Capability::Display), Arc::new(Dummy), Vec::new())
            .unwrap();
        registry
            .register(descriptor("b.B", Capability::Game), Arc::new(Dummy), Vec::new())
            .unwrap();

        assert!(registry.contains("b.B"));
        assert!(registry.get("c.C").is_none());
        assert_eq!(registry.descriptor("a.A").unwrap().capability, Capability::Display);
        assert_eq!(registry.by_capability(Capability::Game).len(), 1);
        assert_eq!(registry.descriptors()[0].id, "a.A");
    }
}
