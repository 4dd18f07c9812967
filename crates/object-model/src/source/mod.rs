//! An importer that reads Python source trees without executing them.
//!
//! Modules are located under a list of search roots the way the Python
//! import system does it: `a.b.c` is `a/b/c/__init__.py` or `a/b/c.py`, and
//! every parent directory must be a package. The source is scanned for the
//! declarations the documentation needs (classes, interfaces, functions,
//! imports, export lists and module docstrings).
//!
//! Results are cached; an import that is already in progress fails, which
//! breaks import cycles.

pub mod lexer;
mod scanner;


use crate::importer::Importer;
use crate::module::Module;
use dashmap::{DashMap, DashSet};
use scanner::ModuleScanner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub struct SourceImporter {
    roots: Vec<PathBuf>,
    fallback: Option<Arc<dyn Importer>>,
    cache: DashMap<String, Option<Arc<Module>>>,
    loading: DashSet<String>,
}

impl SourceImporter {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            fallback: None,
            cache: DashMap::new(),
            loading: DashSet::new(),
        }
    }

    /// Importer consulted for modules that are not found under the roots.
    pub fn with_fallback(mut self, fallback: Arc<dyn Importer>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Find the source file of a module.
    pub fn locate(&self, path: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }
        self.roots
            .iter()
            .find_map(|root| locate_in(root, &segments))
    }

    fn load(&self, path: &str, file: &Path) -> Option<Arc<Module>> {
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                debug!("Cannot read {}: {e}", file.display());
                return None;
            }
        };
        let is_package = file.file_stem().is_some_and(|stem| stem == "__init__");
        Some(ModuleScanner::new(self, path, is_package).scan(&source, file))
    }
}

fn locate_in(root: &Path, segments: &[&str]) -> Option<PathBuf> {
    let (last, parents) = segments.split_last()?;
    let mut dir = root.to_path_buf();
    for parent in parents {
        dir.push(parent);
        if !dir.join("__init__.py").is_file() {
            return None;
        }
    }
    let package = dir.join(last).join("__init__.py");
    if package.is_file() {
        return Some(package);
    }
    let module = dir.join(format!("{last}.py"));
    module.is_file().then_some(module)
}

impl Importer for SourceImporter {
    fn import_module(&self, path: &str) -> Option<Arc<Module>> {
        if let Some(cached) = self.cache.get(path) {
            return cached.value().clone();
        }
        if !self.loading.insert(path.to_string()) {
            debug!("Import cycle while importing `{path}`");
            return None;
        }

        let result = match self.locate(path) {
            Some(file) => self.load(path, &file),
            None => self
                .fallback
                .as_ref()
                .and_then(|fallback| fallback.import_module(path)),
        };
        self.loading.remove(path);

        self.cache
            .entry(path.to_string())
            .or_insert(result)
            .value()
            .clone()
    }
}
