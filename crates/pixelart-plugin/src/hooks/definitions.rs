//! Hook identifiers and entries.

use std::fmt;
use std::str::FromStr;

use pixelart_core::AppError;
use pixelart_core::types::Payload;
use pixelart_pipeline::{Stage, StageFn, StageResult};

use crate::registry::Capability;

/// Parsed hook identifier, `<module>.<TypeName>.<function>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookId {
    /// Module stem.
    pub module: String,
    /// Plugin type name.
    pub type_name: String,
    /// Function name.
    pub function: String,
}

impl HookId {
    /// Builds an id from its parts.
    pub fn new(
        module: impl Into<String>,
        type_name: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            type_name: type_name.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.module, self.type_name, self.function)
    }
}

impl FromStr for HookId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(t), Some(f)) if !m.is_empty() && !t.is_empty() && !f.is_empty() => {
                Ok(Self::new(m, t, f))
            }
            _ => Err(AppError::configuration(format!(
                "Invalid hook id '{s}': expected module.TypeName.function"
            ))),
        }
    }
}

/// One invocable hook of a registered plugin.
#[derive(Clone)]
pub struct HookEntry {
    /// Hook id string.
    pub name: String,
    /// Capability group the hook belongs to.
    pub capability: Capability,
    invoke: StageFn,
}

impl fmt::Debug for HookEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEntry")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .finish()
    }
}

impl HookEntry {
    /// Creates an entry from a callable.
    pub fn new(name: impl Into<String>, capability: Capability, invoke: StageFn) -> Self {
        Self {
            name: name.into(),
            capability,
            invoke,
        }
    }

    /// Invokes the hook body directly, outside any rendezvous.
    pub fn invoke(&self, input: Option<Payload>) -> StageResult<Option<Payload>> {
        (self.invoke)(input)
    }

    /// Converts into a scheduler stage.
    pub fn to_stage(&self) -> Stage {
        Stage::from_fn(self.name.clone(), self.invoke.clone())
    }
}
