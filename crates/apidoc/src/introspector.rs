//! The capabilities every documentation node works with.

use crate::classregistry::ClassRegistry;
use crate::utilities::render::{BasicRenderer, TextRenderer};
use object_model::{ComponentRegistry, ConfigurationContext, Importer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Names of the documentation modules the root can expose.
pub const DOCUMENTATION_MODULES: [&str; 4] = ["Code", "Interface", "Utility", "ZCML"];

#[derive(Debug, Clone)]
pub struct Settings {
    /// Introspective views are only served in development mode.
    pub devmode: bool,
    /// Documentation modules exposed by the root, by key.
    pub modules: Vec<String>,
    /// Top-level packages listed by the code browser.
    pub roots: Vec<String>,
    /// Directories searched for source packages.
    pub search_paths: Vec<PathBuf>,
    /// Dotted paths that are never linked to.
    pub ignore: Vec<String>,
    /// Let the code browser import top-level modules that are not roots.
    pub import_unknown_modules: bool,
    /// URL prefix of the documentation root.
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            devmode: true,
            modules: DOCUMENTATION_MODULES.iter().map(|m| m.to_string()).collect(),
            roots: Vec::new(),
            search_paths: Vec::new(),
            ignore: Vec::new(),
            import_unknown_modules: false,
            base_url: "/++apidoc++".to_string(),
        }
    }
}

impl Settings {
    /// Whether `path` or one of its parent packages is on the ignore list.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore.iter().any(|ignored| {
            path == ignored
                || path
                    .strip_prefix(ignored.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Dotted location of a source file relative to the search paths,
    /// e.g. `pkg/sub/configure.zcml`.
    pub fn relative_source_path(&self, file: &Path) -> Option<String> {
        self.search_paths.iter().find_map(|root| {
            let relative = file.strip_prefix(root).ok()?;
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            (!segments.is_empty()).then(|| segments.join("/"))
        })
    }
}

/// Importer, registries and settings shared by all documentation nodes.
pub struct Introspector {
    importer: Arc<dyn Importer>,
    context: Arc<ConfigurationContext>,
    registry: Arc<ComponentRegistry>,
    classes: ClassRegistry,
    settings: Settings,
    renderer: Arc<dyn TextRenderer>,
}

impl std::fmt::Debug for Introspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Introspector")
            .field("registrations", &self.registry.len())
            .field("classes", &self.classes.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Introspector {
    pub fn new(
        importer: Arc<dyn Importer>,
        context: Arc<ConfigurationContext>,
        registry: Arc<ComponentRegistry>,
    ) -> Self {
        Self {
            importer,
            context,
            registry,
            classes: ClassRegistry::new(),
            settings: Settings::default(),
            renderer: Arc::new(BasicRenderer),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TextRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn importer(&self) -> &dyn Importer {
        self.importer.as_ref()
    }

    pub fn context(&self) -> &ConfigurationContext {
        &self.context
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn renderer(&self) -> &dyn TextRenderer {
        self.renderer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignore_list_matches_packages() {
        let settings = Settings {
            ignore: vec!["pkg.tests".to_string()],
            ..Settings::default()
        };
        assert!(settings.is_ignored("pkg.tests"));
        assert!(settings.is_ignored("pkg.tests.test_foo"));
        assert!(!settings.is_ignored("pkg.testsuite"));
        assert!(!settings.is_ignored("pkg"));
    }

    #[test]
    fn test_relative_source_path() {
        let settings = Settings {
            search_paths: vec![PathBuf::from("/srv/app/src")],
            ..Settings::default()
        };
        assert_eq!(
            settings.relative_source_path(Path::new("/srv/app/src/pkg/configure.zcml")),
            Some("pkg/configure.zcml".to_string())
        );
        assert_eq!(settings.relative_source_path(Path::new("/elsewhere/x.zcml")), None);
    }
}
