//! Pipeline include-lists.

use serde::{Deserialize, Serialize};

/// Ordered list of plugin-function identifiers making up one pipeline.
///
/// Identifiers have the form `<module>.<TypeName>.<function>`; order is
/// execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Identifiers in execution order.
    #[serde(default)]
    pub include: Vec<String>,
}

impl PipelineConfig {
    /// Builds an include-list from anything yielding string-like items.
    pub fn from_include<I, S>(include: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
        }
    }
}
