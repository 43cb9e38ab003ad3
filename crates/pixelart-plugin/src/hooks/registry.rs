//! Hook registry — hook entries grouped by capability, in registration order.

use std::collections::HashMap;

use tracing::debug;

use super::definitions::HookEntry;
use crate::registry::Capability;

/// Registry of hook entries organized by capability.
#[derive(Debug, Default)]
pub struct HookRegistry {
    entries: HashMap<Capability, Vec<HookEntry>>,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to its capability group.
    pub fn register(&mut self, entry: HookEntry) {
        debug!(hook = %entry.name, capability = %entry.capability, "Hook registered");
        self.entries.entry(entry.capability).or_default().push(entry);
    }

    /// Finds an entry by id within the given capability groups.
    pub fn find(&self, capabilities: &[Capability], name: &str) -> Option<&HookEntry> {
        capabilities
            .iter()
            .filter_map(|cap| self.entries.get(cap))
            .flat_map(|entries| entries.iter())
            .find(|entry| entry.name == name)
    }

    /// Hook ids of one capability, in registration order.
    pub fn names(&self, capability: Capability) -> Vec<&str> {
        self.entries
            .get(&capability)
            .map(|entries| entries.iter().map(|e| e.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether no entry is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
