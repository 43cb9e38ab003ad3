//! Plugin manager — runs load → consolidate → install → register → compose.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use pixelart_core::config::{AppConfig, DependencyConfig};
use pixelart_core::traits::RenderTarget;
use pixelart_core::AppResult;
use pixelart_pipeline::SchedulerState;

use crate::catalog::PluginCatalog;
use crate::deps::{CommandInstaller, DependencyInstaller, NoopInstaller, VersionedPackage, consolidate};
use crate::hooks::composer::{ComposedPipelines, HookComposer};
use crate::loader::{ModuleManifest, PluginLoader};
use crate::registry::PluginRegistry;

/// Everything the scheduler needs from the plugin layer.
#[derive(Debug)]
pub struct PluginSet {
    /// Modules selected by the allow-list, in discovery order.
    pub modules: Vec<ModuleManifest>,
    /// Consolidated requirements of those modules.
    pub requirements: Vec<VersionedPackage>,
    /// Registered plugin instances.
    pub registry: PluginRegistry,
    /// Display and cognitive pipelines.
    pub pipelines: ComposedPipelines,
}

/// Drives plugin startup.
#[derive(Debug)]
pub struct PluginManager {
    loader: PluginLoader,
    installer: Arc<dyn DependencyInstaller>,
}

impl PluginManager {
    /// Creates a manager with an explicit installer.
    pub fn new(catalog: PluginCatalog, installer: Arc<dyn DependencyInstaller>) -> Self {
        Self {
            loader: PluginLoader::new(catalog),
            installer,
        }
    }

    /// Creates a manager whose installer follows the `dependencies` section.
    pub fn from_config(catalog: PluginCatalog, config: &DependencyConfig) -> AppResult<Self> {
        let installer: Arc<dyn DependencyInstaller> = if config.install {
            Arc::new(CommandInstaller::from_config(config)?)
        } else {
            Arc::new(NoopInstaller)
        };
        Ok(Self::new(catalog, installer))
    }

    /// The loader used for discovery and instantiation.
    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// Discovers and reads the modules the include-lists need.
    pub fn scan(&self, config: &AppConfig) -> AppResult<Vec<ModuleManifest>> {
        self.loader
            .scan(Path::new(&config.plugins.directory), &config.allow_list())
    }

    /// Consolidated requirements of the given modules.
    pub fn requirements(modules: &[ModuleManifest]) -> Vec<VersionedPackage> {
        consolidate(modules.iter().flat_map(|m| m.requirements.iter()))
    }

    /// Full startup: scan, consolidate, install, instantiate, compose.
    pub async fn load(
        &self,
        config: &AppConfig,
        render: &Arc<dyn RenderTarget>,
        state: &Arc<SchedulerState>,
    ) -> AppResult<PluginSet> {
        let modules = self.scan(config)?;
        let requirements = Self::requirements(&modules);
        self.installer.install(&requirements).await?;
        self.assemble(config, modules, requirements, render, state)
    }

    /// Startup without the install step, for inspection.
    pub fn load_without_install(
        &self,
        config: &AppConfig,
        render: &Arc<dyn RenderTarget>,
        state: &Arc<SchedulerState>,
    ) -> AppResult<PluginSet> {
        let modules = self.scan(config)?;
        let requirements = Self::requirements(&modules);
        self.assemble(config, modules, requirements, render, state)
    }

    fn assemble(
        &self,
        config: &AppConfig,
        modules: Vec<ModuleManifest>,
        requirements: Vec<VersionedPackage>,
        render: &Arc<dyn RenderTarget>,
        state: &Arc<SchedulerState>,
    ) -> AppResult<PluginSet> {
        let registry = self.loader.instantiate(&modules, render, state)?;
        let pipelines = HookComposer::new(registry.hooks())
            .compose_all(&config.display.include, &config.cognitive.include);

        info!(
            modules = modules.len(),
            plugins = registry.len(),
            display = pipelines.display.len(),
            cognitive = pipelines.cognitive.len(),
            "Plugins loaded"
        );

        Ok(PluginSet {
            modules,
            requirements,
            registry,
            pipelines,
        })
    }
}
