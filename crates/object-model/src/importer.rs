//! The importer capability: dotted module name to module.

use crate::module::Module;
use crate::object::Object;
use crate::wellknown;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

pub trait Importer: Send + Sync {
    /// Import the module at `path`, or `None` when it cannot be imported.
    fn import_module(&self, path: &str) -> Option<Arc<Module>>;
}

/// Resolve a dotted name to an object.
///
/// The longest importable module prefix is imported and the remaining
/// segments are looked up as attributes.
pub fn resolve(importer: &dyn Importer, dotted: &str) -> Option<Object> {
    let dotted = dotted.trim();
    if dotted.is_empty() {
        return None;
    }
    let segments: Vec<&str> = dotted.split('.').collect();
    for split in (1..=segments.len()).rev() {
        let module_path = segments[..split].join(".");
        let Some(module) = importer.import_module(&module_path) else {
            continue;
        };
        let mut current = Object::Module(module);
        for segment in &segments[split..] {
            current = match current.attribute(segment) {
                Some(next) => next,
                None => {
                    debug!("Cannot resolve `{dotted}`: no attribute `{segment}`");
                    return None;
                }
            };
        }
        return Some(current);
    }
    debug!("Cannot resolve `{dotted}`: no importable module prefix");
    None
}

/// An in-memory module table.
#[derive(Default)]
pub struct StaticImporter {
    modules: FxHashMap<String, Arc<Module>>,
}

impl StaticImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table preloaded with the framework's own modules.
    pub fn with_builtins() -> Self {
        let mut importer = Self::new();
        for module in wellknown::builtin_modules() {
            importer.add(module.clone());
        }
        importer
    }

    pub fn add(&mut self, module: Arc<Module>) {
        self.modules.insert(module.path().to_string(), module);
    }

    pub fn with(mut self, module: Arc<Module>) -> Self {
        self.add(module);
        self
    }
}

impl Importer for StaticImporter {
    fn import_module(&self, path: &str) -> Option<Arc<Module>> {
        self.modules.get(path).cloned()
    }
}

/// Tries each importer in turn; the first one that succeeds wins.
#[derive(Default)]
pub struct ChainImporter {
    importers: Vec<Arc<dyn Importer>>,
}

impl ChainImporter {
    pub fn new(importers: Vec<Arc<dyn Importer>>) -> Self {
        Self { importers }
    }
}

impl Importer for ChainImporter {
    fn import_module(&self, path: &str) -> Option<Arc<Module>> {
        self.importers
            .iter()
            .find_map(|importer| importer.import_module(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;

    fn importer() -> StaticImporter {
        let class = Class::builder("pkg.mod", "A").build();
        StaticImporter::with_builtins()
            .with(Module::builder("pkg").build())
            .with(
                Module::builder("pkg.mod")
                    .member("A", Object::Class(class))
                    .build(),
            )
    }

    #[test]
    fn test_resolve_module_and_attribute() {
        let importer = importer();
        assert!(matches!(resolve(&importer, "pkg.mod"), Some(Object::Module(_))));
        assert!(matches!(resolve(&importer, "pkg.mod.A"), Some(Object::Class(_))));
        assert!(resolve(&importer, "pkg.mod.B").is_none());
        assert!(resolve(&importer, "missing.thing").is_none());
        assert!(resolve(&importer, "").is_none());
    }

    #[test]
    fn test_resolve_builtin_interface() {
        let importer = importer();
        let resolved = resolve(&importer, wellknown::INTERFACE);
        assert!(resolved.and_then(|o| o.as_interface().cloned()).is_some_and(|i| i.is_top()));
    }

    #[test]
    fn test_chain_importer_prefers_first() {
        let first: Arc<dyn Importer> =
            Arc::new(StaticImporter::new().with(Module::builder("pkg").doc("first").build()));
        let second: Arc<dyn Importer> =
            Arc::new(StaticImporter::new().with(Module::builder("pkg").doc("second").build()));
        let chain = ChainImporter::new(vec![first, second]);

        assert_eq!(chain.import_module("pkg").map(|m| m.doc().to_string()).as_deref(), Some("first"));
        assert!(chain.import_module("other").is_none());
    }
}
