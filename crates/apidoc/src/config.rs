//! The `apidoc.toml` boot configuration.

use crate::app::Apidoc;
use crate::errors::{ApidocError, Result};
use crate::introspector::{DOCUMENTATION_MODULES, Introspector, Settings};
use crate::metaconfig::load_meta_file;
use object_model::{
    ChainImporter, ComponentRegistry, ConfigurationContext, Importer, RegistryManifest, SourceImporter,
    StaticImporter,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "apidoc.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApidocConfig {
    pub devmode: bool,
    /// Documentation modules exposed by the root.
    pub modules: Vec<String>,
    /// Top-level packages listed by the code browser.
    pub roots: Vec<String>,
    /// Directories source packages are imported from.
    pub search_paths: Vec<PathBuf>,
    /// Dotted paths never linked to.
    pub ignore: Vec<String>,
    /// Meta configuration files declaring the known directives.
    pub meta_files: Vec<PathBuf>,
    /// JSON manifest of the component registry.
    pub registrations: Option<PathBuf>,
    /// Features provided to configuration conditions.
    pub features: Vec<String>,
    pub import_unknown_modules: bool,
    pub base_url: String,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Default for ApidocConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            devmode: settings.devmode,
            modules: DOCUMENTATION_MODULES.iter().map(|m| m.to_string()).collect(),
            roots: Vec::new(),
            search_paths: Vec::new(),
            ignore: Vec::new(),
            meta_files: Vec::new(),
            registrations: None,
            features: Vec::new(),
            import_unknown_modules: false,
            base_url: settings.base_url,
            base_dir: PathBuf::new(),
        }
    }
}

impl ApidocConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ApidocError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml(&content, base_dir).map_err(|e| match e {
            ApidocError::Config { reason, .. } => ApidocError::Config {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a configuration; relative paths resolve against `base_dir`.
    pub fn from_toml(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: ApidocConfig = toml::from_str(content).map_err(|e| ApidocError::Config {
            path: PathBuf::from(CONFIG_FILE_NAME),
            reason: e.to_string(),
        })?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            devmode: self.devmode,
            modules: self.modules.clone(),
            roots: self.roots.clone(),
            search_paths: self.search_paths.iter().map(|p| self.resolve_path(p)).collect(),
            ignore: self.ignore.clone(),
            import_unknown_modules: self.import_unknown_modules,
            base_url: self.base_url.clone(),
        }
    }

    /// Built-in framework modules first, then the source trees.
    pub fn importer(&self) -> Arc<dyn Importer> {
        let builtins: Arc<dyn Importer> = Arc::new(StaticImporter::with_builtins());
        let sources = SourceImporter::new(self.settings().search_paths).with_fallback(builtins.clone());
        Arc::new(ChainImporter::new(vec![builtins, Arc::new(sources)]))
    }

    /// Set up the application: configuration context, component registry
    /// and documentation tree.
    pub fn build(&self) -> Result<Apidoc> {
        let settings = self.settings();
        let importer = self.importer();

        let mut context = ConfigurationContext::new(importer.clone());
        for feature in &self.features {
            context.provide_feature(feature.clone());
        }
        for meta_file in &self.meta_files {
            let path = self.resolve_path(meta_file);
            let package = package_of(&settings, &path);
            load_meta_file(&mut context, &path, package.as_deref())?;
        }

        let mut registry = ComponentRegistry::new();
        if let Some(registrations) = &self.registrations {
            let manifest = RegistryManifest::load(&self.resolve_path(registrations))?;
            let report = manifest.apply(&mut registry, importer.as_ref());
            if report.skipped > 0 {
                warn!("Skipped {} unresolvable registrations", report.skipped);
            }
            info!("Registered {} components", report.registered);
        }

        let intro = Introspector::new(importer, Arc::new(context), Arc::new(registry)).with_settings(settings);
        Ok(Apidoc::new(intro))
    }
}

/// Dotted package a configuration file belongs to, from its location
/// below the search paths.
fn package_of(settings: &Settings, file: &Path) -> Option<String> {
    let relative = settings.relative_source_path(file)?;
    let (dirs, _) = relative.rsplit_once('/')?;
    Some(dirs.replace('/', "."))
}
