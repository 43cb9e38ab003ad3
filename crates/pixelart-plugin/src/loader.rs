//! Plugin loader: discovery, filtering, instantiation, classification.
//!
//! A plugin module is declared on disk by a `<stem>.plugin.toml` manifest
//! and implemented by a factory compiled into the [`PluginCatalog`]. The
//! optional `requirements.txt` next to the manifest lists the packages the
//! module needs at runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use pixelart_core::traits::RenderTarget;
use pixelart_core::types::Payload;
use pixelart_core::{AppError, AppResult};
use pixelart_pipeline::{SchedulerState, StageError, StageResult};

use crate::api::context::PluginContext;
use crate::catalog::PluginCatalog;
use crate::deps::{VersionedPackage, parse_requirements};
use crate::hooks::definitions::{HookEntry, HookId};
use crate::registry::{Capability, PluginDescriptor, PluginRegistry};
use crate::traits::Plugin;

/// File name suffix of module manifests.
pub const MANIFEST_SUFFIX: &str = ".plugin.toml";

/// Requirements file looked up next to each manifest.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// A discovered plugin module.
#[derive(Debug, Clone)]
pub struct ModuleManifest {
    /// Module stem, e.g. `display_image_plugins`.
    pub stem: String,
    /// Manifest path.
    pub path: PathBuf,
    /// Directory holding the manifest.
    pub directory: PathBuf,
    /// Per-plugin `[plugin]`/`[plugins]` table, empty if absent.
    pub config: toml::Table,
    /// Parsed `requirements.txt`, empty if absent.
    pub requirements: Vec<VersionedPackage>,
}

impl ModuleManifest {
    /// Reads a manifest and its sibling requirements file.
    pub fn read(path: &Path) -> AppResult<Self> {
        let stem = module_stem(path).ok_or_else(|| {
            AppError::plugin(format!("'{}' is not a plugin manifest", path.display()))
        })?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                pixelart_core::ErrorKind::Plugin,
                format!("Failed to read manifest '{}'", path.display()),
                e,
            )
        })?;
        let table: toml::Table = text.parse().map_err(|e| {
            AppError::with_source(
                pixelart_core::ErrorKind::Plugin,
                format!("Invalid manifest '{}'", path.display()),
                e,
            )
        })?;
        let config = table
            .get("plugin")
            .or_else(|| table.get("plugins"))
            .and_then(|v| v.as_table())
            .cloned()
            .unwrap_or_default();

        let requirements_path = directory.join(REQUIREMENTS_FILE);
        let requirements = if requirements_path.is_file() {
            let text = std::fs::read_to_string(&requirements_path)?;
            parse_requirements(&text).map_err(|e| {
                AppError::with_source(
                    pixelart_core::ErrorKind::Dependency,
                    format!("Invalid requirements '{}'", requirements_path.display()),
                    e,
                )
            })?
        } else {
            Vec::new()
        };

        Ok(Self {
            stem,
            path: path.to_path_buf(),
            directory,
            config,
            requirements,
        })
    }
}

/// Module stem of a manifest path, `None` if the name lacks the suffix.
pub fn module_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(MANIFEST_SUFFIX)?;
    (!stem.is_empty()).then(|| stem.to_string())
}

/// `__init__`-style names: leading `__`, or `x__y__z`.
fn is_dunder(name: &str) -> bool {
    if name.starts_with("__") {
        return true;
    }
    let hits: Vec<usize> = name.match_indices("__").map(|(i, _)| i).collect();
    hits.iter()
        .any(|&i| hits.iter().any(|&j| j >= i + 3 && j + 2 < name.len()))
}

/// Collects module manifests under `root`, sorted by path.
///
/// Dunder names and anything below an `assets` directory are skipped. A
/// missing root yields no modules.
pub fn discover(root: &Path) -> AppResult<Vec<PathBuf>> {
    if !root.exists() {
        warn!(root = %root.display(), "Plugin root does not exist; no modules discovered");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            AppError::plugin(format!("Failed to walk plugin root '{}': {}", root.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if module_stem(path).is_none() || is_dunder(name) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if relative.components().any(|c| c.as_os_str() == "assets") {
            continue;
        }
        found.push(path.to_path_buf());
    }

    found.sort();
    debug!(count = found.len(), "Module manifests discovered");
    Ok(found)
}

/// Keeps the manifests whose stem is a prefix of some allow-list entry.
pub fn filter_modules(paths: Vec<PathBuf>, allow_list: &[String]) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| match module_stem(path) {
            Some(stem) => {
                let keep = allow_list.iter().any(|entry| entry.starts_with(&stem));
                if !keep {
                    debug!(module = %stem, "Module not in allow-list; skipping");
                }
                keep
            }
            None => false,
        })
        .collect()
}

/// A plugin instance after classification.
#[derive(Debug)]
pub struct ClassifiedPlugin {
    /// Descriptor for the registry.
    pub descriptor: PluginDescriptor,
    /// The instance.
    pub instance: Arc<dyn Plugin>,
    /// Hook entries it exposes.
    pub hooks: Vec<HookEntry>,
}

/// Resolves a plugin's capability and builds its hook entries.
///
/// Returns `Ok(None)` for a type that conforms to no capability, and a
/// plugin error for a type that is both display and cognitive.
pub fn classify(
    module: &str,
    instance: Arc<dyn Plugin>,
    dependencies: &[VersionedPackage],
) -> AppResult<Option<ClassifiedPlugin>> {
    let type_name = instance.type_name().to_string();
    let id = format!("{module}.{type_name}");

    let display = Arc::clone(&instance).as_display();
    let cognitive = Arc::clone(&instance).as_cognitive();
    let game = Arc::clone(&instance).as_game();

    let (capability, hooks) = match (display, cognitive, game) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
            return Err(AppError::plugin(format!(
                "Plugin '{id}' conforms to both display and cognitive contracts"
            )));
        }
        (Some(display), None, None) => {
            let hooks: Vec<HookEntry> = display
                .display_hooks()
                .into_iter()
                .map(|function| {
                    let plugin = Arc::clone(&display);
                    let name = HookId::new(module, &type_name, function).to_string();
                    HookEntry::new(
                        name,
                        Capability::Display,
                        Arc::new(move |_: Option<Payload>| -> StageResult<Option<Payload>> {
                            plugin.show(function)?;
                            Ok(None)
                        }),
                    )
                })
                .collect();
            (Capability::Display, hooks)
        }
        (None, cognitive, game) => {
            let capability = if game.is_some() {
                Capability::Game
            } else {
                Capability::Cognitive
            };
            let cognitive = match (cognitive, game) {
                (Some(c), _) => c,
                (None, Some(_)) => {
                    return Err(AppError::plugin(format!(
                        "Plugin '{id}' reports a game contract without a cognitive one"
                    )));
                }
                (None, None) => {
                    warn!(plugin_id = %id, "Plugin conforms to no capability; skipping");
                    return Ok(None);
                }
            };
            let hooks: Vec<HookEntry> = cognitive
                .cognitive_hooks()
                .into_iter()
                .map(|function| {
                    let plugin = Arc::clone(&cognitive);
                    let name = HookId::new(module, &type_name, function).to_string();
                    HookEntry::new(
                        name,
                        capability,
                        Arc::new(move |input: Option<Payload>| plugin.process(function, input)),
                    )
                })
                .collect();
            (capability, hooks)
        }
    };

    let descriptor = PluginDescriptor {
        id,
        module: module.to_string(),
        type_name,
        capability,
        dependencies: dependencies.to_vec(),
        hooks: hooks.iter().map(|h| h.name.clone()).collect(),
    };
    Ok(Some(ClassifiedPlugin {
        descriptor,
        instance,
        hooks,
    }))
}

/// Error for a hook name the plugin does not expose.
pub fn unknown_hook(type_name: &str, hook: &str) -> StageError {
    StageError::failed(format!("{type_name} has no hook '{hook}'"))
}

/// Turns module manifests into registered plugins.
#[derive(Debug, Clone)]
pub struct PluginLoader {
    catalog: PluginCatalog,
}

impl PluginLoader {
    /// Creates a loader over a catalog.
    pub fn new(catalog: PluginCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog this loader instantiates from.
    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Discovers, filters and reads the modules the allow-list needs.
    pub fn scan(&self, root: &Path, allow_list: &[String]) -> AppResult<Vec<ModuleManifest>> {
        let discovered = discover(root)?;
        let total = discovered.len();
        let selected = filter_modules(discovered, allow_list);
        info!(
            root = %root.display(),
            discovered = total,
            selected = selected.len(),
            "Plugin modules scanned"
        );
        selected.iter().map(|p| ModuleManifest::read(p)).collect()
    }

    /// Instantiates and classifies every plugin of the given modules, in order,
    /// and registers them.
    pub fn instantiate(
        &self,
        modules: &[ModuleManifest],
        render: &Arc<dyn RenderTarget>,
        state: &Arc<SchedulerState>,
    ) -> AppResult<PluginRegistry> {
        let mut registry = PluginRegistry::new();

        for module in modules {
            let factory = self.catalog.get(&module.stem).ok_or_else(|| {
                AppError::plugin(format!(
                    "Module '{}' ({}) has no compiled-in factory",
                    module.stem,
                    module.path.display()
                ))
            })?;

            let context = PluginContext::new(
                module.stem.clone(),
                module.directory.clone(),
                module.config.clone(),
                Arc::clone(render),
                Arc::clone(state),
            );
            let instances = factory(&context).map_err(|e| {
                AppError::plugin(format!(
                    "Factory for module '{}' failed: {}",
                    module.stem, e
                ))
            })?;

            for instance in instances {
                if let Some(classified) = classify(&module.stem, instance, &module.requirements)? {
                    registry.register(
                        classified.descriptor,
                        classified.instance,
                        classified.hooks,
                    )?;
                }
            }
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use pixelart_core::config::SchedulerConfig;
    use pixelart_core::matrix::HeadlessMatrix;

    use crate::traits::{CognitivePlugin, DisplayPlugin, GamePlugin};

    fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[derive(Debug)]
    struct Show;
    impl Plugin for Show {
        fn type_name(&self) -> &str {
            "Show"
        }
        fn as_display(self: Arc<Self>) -> Option<Arc<dyn DisplayPlugin>> {
            Some(self)
        }
    }
    impl DisplayPlugin for Show {
        fn display_hooks(&self) -> Vec<&'static str> {
            vec!["blink"]
        }
        fn show(&self, hook: &str) -> StageResult<()> {
            match hook {
                "blink" => Ok(()),
                other => Err(unknown_hook("Show", other)),
            }
        }
    }

    #[derive(Debug)]
    struct Think;
    impl Plugin for Think {
        fn type_name(&self) -> &str {
            "Think"
        }
        fn as_cognitive(self: Arc<Self>) -> Option<Arc<dyn CognitivePlugin>> {
            Some(self)
        }
    }
    impl CognitivePlugin for Think {
        fn cognitive_hooks(&self) -> Vec<&'static str> {
            vec!["echo"]
        }
        fn process(&self, _hook: &str, input: Option<Payload>) -> StageResult<Option<Payload>> {
            Ok(input)
        }
    }

    #[derive(Debug)]
    struct Play(PluginContext);
    impl Plugin for Play {
        fn type_name(&self) -> &str {
            "Play"
        }
        fn as_cognitive(self: Arc<Self>) -> Option<Arc<dyn CognitivePlugin>> {
            Some(self)
        }
        fn as_game(self: Arc<Self>) -> Option<Arc<dyn GamePlugin>> {
            Some(self)
        }
    }
    impl CognitivePlugin for Play {
        fn cognitive_hooks(&self) -> Vec<&'static str> {
            vec!["play"]
        }
        fn process(&self, _hook: &str, _input: Option<Payload>) -> StageResult<Option<Payload>> {
            Ok(None)
        }
    }
    impl GamePlugin for Play {
        fn context(&self) -> &PluginContext {
            &self.0
        }
    }

    #[derive(Debug)]
    struct Both;
    impl Plugin for Both {
        fn type_name(&self) -> &str {
            "Both"
        }
        fn as_display(self: Arc<Self>) -> Option<Arc<dyn DisplayPlugin>> {
            Some(self)
        }
        fn as_cognitive(self: Arc<Self>) -> Option<Arc<dyn CognitivePlugin>> {
            Some(self)
        }
    }
    impl DisplayPlugin for Both {
        fn display_hooks(&self) -> Vec<&'static str> {
            Vec::new()
        }
        fn show(&self, _hook: &str) -> StageResult<()> {
            Ok(())
        }
    }
    impl CognitivePlugin for Both {
        fn cognitive_hooks(&self) -> Vec<&'static str> {
            Vec::new()
        }
        fn process(&self, _hook: &str, _input: Option<Payload>) -> StageResult<Option<Payload>> {
            Ok(None)
        }
    }

    #[derive(Debug)]
    struct Nothing;
    impl Plugin for Nothing {
        fn type_name(&self) -> &str {
            "Nothing"
        }
    }

    fn render() -> Arc<dyn RenderTarget> {
        Arc::new(HeadlessMatrix::new(8, 8))
    }

    fn state() -> Arc<SchedulerState> {
        Arc::new(SchedulerState::new(&SchedulerConfig::default()))
    }

    fn manifest(stem: &str) -> ModuleManifest {
        ModuleManifest {
            stem: stem.to_string(),
            path: PathBuf::from(format!("/p/{stem}{MANIFEST_SUFFIX}")),
            directory: PathBuf::from("/p"),
            config: toml::Table::new(),
            requirements: Vec::new(),
        }
    }

    #[test]
    fn test_dunder_detection() {
        assert!(is_dunder("__init__.plugin.toml"));
        assert!(is_dunder("a__b__c.plugin.toml"));
        assert!(!is_dunder("display_image_plugins.plugin.toml"));
        assert!(!is_dunder("a__b.plugin.toml"));
    }

    #[test]
    fn test_discover_skips_dunder_assets_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "rgb/display_image/display_image_plugins.plugin.toml", "");
        write(root, "rgb/display_image/__init__.plugin.toml", "");
        write(root, "rgb/display_image/assets/font.plugin.toml", "");
        write(root, "ai/image_source/image_source.plugin.toml", "");
        write(root, "ai/image_source/notes.toml", "");

        let found = discover(root).unwrap();
        let stems: Vec<String> = found.iter().filter_map(|p| module_stem(p)).collect();
        assert_eq!(stems, vec!["image_source", "display_image_plugins"]);
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_filter_uses_stem_prefix() {
        let paths = vec![
            PathBuf::from("/p/fill_screen_plugins.plugin.toml"),
            PathBuf::from("/p/random_pixel_plugins.plugin.toml"),
        ];
        let allow = vec!["fill_screen_plugins.FillScreenPlugins.display_strobe_fill".to_string()];
        let kept = filter_modules(paths, &allow);
        assert_eq!(kept, vec![PathBuf::from("/p/fill_screen_plugins.plugin.toml")]);
        assert!(filter_modules(kept, &[]).is_empty());
    }

    #[test]
    fn test_manifest_reads_config_and_requirements() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "rgb/display_image/display_image_plugins.plugin.toml",
            "[plugin]\nimage_display_time = 2\n",
        );
        write(
            dir.path(),
            "rgb/display_image/requirements.txt",
            "# display deps\npillow>=10.0.0\n\nnumpy\n",
        );

        let manifest = ModuleManifest::read(&path).unwrap();
        assert_eq!(manifest.stem, "display_image_plugins");
        assert_eq!(
            manifest.config.get("image_display_time").and_then(|v| v.as_integer()),
            Some(2)
        );
        assert_eq!(manifest.requirements.len(), 2);
        assert_eq!(manifest.requirements[0].to_string(), "pillow>=10.0.0");
    }

    #[test]
    fn test_manifest_accepts_plural_table_and_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "m.plugin.toml", "[plugins]\nnum_sprites = 4\n");
        let manifest = ModuleManifest::read(&path).unwrap();
        assert!(manifest.config.contains_key("num_sprites"));

        let bad = write(dir.path(), "bad.plugin.toml", "[plugin\n");
        let err = ModuleManifest::read(&bad).unwrap_err();
        assert!(err.is(pixelart_core::ErrorKind::Plugin));
    }

    #[test]
    fn test_classification() {
        let show = classify("m", Arc::new(Show), &[]).unwrap().unwrap();
        assert_eq!(show.descriptor.capability, Capability::Display);
        assert_eq!(show.descriptor.hooks, vec!["m.Show.blink"]);

        let think = classify("m", Arc::new(Think), &[]).unwrap().unwrap();
        assert_eq!(think.descriptor.capability, Capability::Cognitive);

        let ctx = PluginContext::new("g", "/p", toml::Table::new(), render(), state());
        let play = classify("g", Arc::new(Play(ctx)), &[]).unwrap().unwrap();
        assert_eq!(play.descriptor.capability, Capability::Game);
        assert_eq!(play.hooks[0].capability, Capability::Game);

        assert!(classify("m", Arc::new(Nothing), &[]).unwrap().is_none());
        assert!(classify("m", Arc::new(Both), &[]).is_err());
    }

    #[test]
    fn test_display_hook_entry_returns_none() {
        let show = classify("m", Arc::new(Show), &[]).unwrap().unwrap();
        assert_eq!(show.hooks[0].invoke(Some(Payload::text("ignored"))), Ok(None));
    }

    #[test]
    fn test_instantiate_registers_in_module_order() {
        let catalog = PluginCatalog::new()
            .with("show", |_ctx| Ok(vec![Arc::new(Show) as Arc<dyn Plugin>]))
            .with("think", |_ctx| {
                Ok(vec![Arc::new(Think) as Arc<dyn Plugin>, Arc::new(Nothing)])
            });
        let loader = PluginLoader::new(catalog);

        let registry = loader
            .instantiate(&[manifest("think"), manifest("show")], &render(), &state())
            .unwrap();
        let ids: Vec<&str> = registry.descriptors().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["think.Think", "show.Show"]);
        assert_eq!(registry.hooks().len(), 2);
    }

    #[test]
    fn test_missing_factory_and_factory_error_abort() {
        let loader = PluginLoader::new(
            PluginCatalog::new().with("broken", |_ctx| Err(AppError::internal("no model"))),
        );
        let err = loader
            .instantiate(&[manifest("unknown")], &render(), &state())
            .unwrap_err();
        assert!(err.is(pixelart_core::ErrorKind::Plugin));

        let err = loader
            .instantiate(&[manifest("broken")], &render(), &state())
            .unwrap_err();
        assert!(err.is(pixelart_core::ErrorKind::Plugin));
        assert!(err.message.contains("no model"));
    }

    #[test]
    fn test_duplicate_plugin_ids_abort() {
        let loader = PluginLoader::new(PluginCatalog::new().with("show", |_ctx| {
            Ok(vec![Arc::new(Show) as Arc<dyn Plugin>, Arc::new(Show)])
        }));
        assert!(
            loader
                .instantiate(&[manifest("show")], &render(), &state())
                .is_err()
        );
    }
}
