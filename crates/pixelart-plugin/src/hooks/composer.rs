//! Hook composer — builds the two pipelines from include-lists.

use serde::Serialize;
use tracing::{info, warn};

use pixelart_pipeline::Stage;

use super::definitions::HookEntry;
use super::registry::HookRegistry;
use crate::registry::Capability;

/// The two pipelines the scheduler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Display plugins only.
    Display,
    /// Cognitive and game plugins, merged in configured order.
    Cognitive,
}

impl PipelineKind {
    /// Capability groups an include entry of this pipeline may resolve in.
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Display => &[Capability::Display],
            Self::Cognitive => &[Capability::Cognitive, Capability::Game],
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Display => write!(f, "display"),
            Self::Cognitive => write!(f, "cognitive"),
        }
    }
}

/// Ordered list of resolved hook entries.
#[derive(Debug, Clone)]
pub struct Pipeline {
    kind: PipelineKind,
    entries: Vec<HookEntry>,
}

impl Pipeline {
    /// Which pipeline this is.
    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    /// Resolved entries, in include-list order.
    pub fn entries(&self) -> &[HookEntry] {
        &self.entries
    }

    /// Hook ids, in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pipeline has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scheduler stages for this pipeline.
    pub fn to_stages(&self) -> Vec<Stage> {
        self.entries.iter().map(HookEntry::to_stage).collect()
    }
}

/// Both composed pipelines.
#[derive(Debug, Clone)]
pub struct ComposedPipelines {
    /// Display pipeline.
    pub display: Pipeline,
    /// Cognitive pipeline.
    pub cognitive: Pipeline,
}

/// Resolves include-list entries against a hook registry.
#[derive(Debug)]
pub struct HookComposer<'a> {
    hooks: &'a HookRegistry,
}

impl<'a> HookComposer<'a> {
    /// Creates a composer over a hook registry.
    pub fn new(hooks: &'a HookRegistry) -> Self {
        Self { hooks }
    }

    /// Builds one pipeline.
    ///
    /// Entries are appended in include order; entries that do not resolve
    /// within the pipeline's capability groups are skipped with a warning.
    pub fn compose(&self, kind: PipelineKind, include: &[String]) -> Pipeline {
        let mut entries = Vec::with_capacity(include.len());
        for name in include {
            match self.hooks.find(kind.capabilities(), name) {
                Some(entry) => entries.push(entry.clone()),
                None => warn!(
                    pipeline = %kind,
                    hook = %name,
                    "Include entry does not match any loaded hook; skipping"
                ),
            }
        }
        info!(
            pipeline = %kind,
            requested = include.len(),
            resolved = entries.len(),
            "Pipeline composed"
        );
        Pipeline { kind, entries }
    }

    /// Builds both pipelines.
    pub fn compose_all(
        &self,
        display_include: &[String],
        cognitive_include: &[String],
    ) -> ComposedPipelines {
        ComposedPipelines {
            display: self.compose(PipelineKind::Display, display_include),
            cognitive: self.compose(PipelineKind::Cognitive, cognitive_include),
        }
    }
}
