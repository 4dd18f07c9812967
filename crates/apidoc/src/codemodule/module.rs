use super::{IGNORE_FILES, TextFileNode, ZcmlFileNode, attribute_node, declared_node, public_entries};
use crate::introspector::Introspector;
use crate::location::{Container, DocNode};
use ignore::WalkBuilder;
use object_model::{Interface, Module, Object};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

/// A package or module of the code browser.
pub struct ModuleNode {
    intro: Arc<Introspector>,
    module: Arc<Module>,
    children: OnceLock<BTreeMap<String, DocNode>>,
    /// Unlisted sub-modules resolved by lookup.
    imported: RwLock<BTreeMap<String, DocNode>>,
}

impl ModuleNode {
    pub fn new(intro: Arc<Introspector>, module: Arc<Module>) -> Self {
        Self {
            intro,
            module,
            children: OnceLock::new(),
            imported: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> &str {
        self.module.path()
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.module.file()
    }

    pub fn doc(&self) -> &str {
        self.module.doc()
    }

    pub fn is_package(&self) -> bool {
        self.module.is_package()
    }

    pub fn declared_interfaces(&self) -> &[Arc<Interface>] {
        self.module.provides()
    }

    fn children(&self) -> &BTreeMap<String, DocNode> {
        self.children.get_or_init(|| {
            let mut children = BTreeMap::new();
            if self.is_package() {
                self.add_package_entries(&mut children);
            }
            self.add_declarations(&mut children);
            children
        })
    }

    fn add_package_entries(&self, children: &mut BTreeMap<String, DocNode>) {
        for dir in self.module.search_paths() {
            let walker = WalkBuilder::new(&dir)
                .max_depth(Some(1))
                .standard_filters(false)
                .sort_by_file_name(|a, b| a.cmp(b))
                .build();
            for entry in walker.flatten() {
                if entry.depth() == 0 {
                    continue;
                }
                let Some(file_name) = entry.file_name().to_str() else {
                    continue;
                };
                if IGNORE_FILES.contains(&file_name) {
                    continue;
                }
                let path = entry.path();
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());

                if is_dir {
                    if path.join("__init__.py").is_file() {
                        self.add_submodule(children, file_name);
                    }
                    continue;
                }
                let (stem, extension) = match file_name.rsplit_once('.') {
                    Some(parts) => parts,
                    None => continue,
                };
                match extension {
                    "py" | "pyc" | "pyo" if stem != "__init__" => {
                        if !children.contains_key(stem) {
                            self.add_submodule(children, stem);
                        }
                    }
                    "zcml" => {
                        let node = ZcmlFileNode::new(self.intro.clone(), path.to_path_buf(), self.path());
                        children.insert(file_name.to_string(), DocNode::ZcmlFile(Arc::new(node)));
                    }
                    "txt" | "rst" => {
                        let node = TextFileNode::new(path.to_path_buf());
                        children.insert(file_name.to_string(), DocNode::TextFile(Arc::new(node)));
                    }
                    _ => {}
                }
            }
        }
    }

    fn add_submodule(&self, children: &mut BTreeMap<String, DocNode>, name: &str) {
        let path = format!("{}.{name}", self.path());
        match self.intro.importer().import_module(&path) {
            Some(module) => {
                let node = ModuleNode::new(self.intro.clone(), module);
                children.insert(name.to_string(), DocNode::Module(Arc::new(node)));
            }
            None => debug!("Skipping `{path}`: module cannot be imported"),
        }
    }

    /// Names documented by the module: those declared by the interfaces
    /// the module provides, else its export list, else every member
    /// defined in the module under its own name.
    fn documented_names(&self) -> Vec<String> {
        let provided = self.module.provides();
        if !provided.is_empty() {
            return provided.iter().flat_map(|iface| iface.names(true)).collect();
        }
        if let Some(all) = self.module.all() {
            return all.to_vec();
        }
        self.module
            .members()
            .iter()
            .filter(|(key, value)| {
                value.module_path().as_deref() == Some(self.path())
                    && value.name().as_deref() == Some(key.as_str())
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn add_declarations(&self, children: &mut BTreeMap<String, DocNode>) {
        for name in self.documented_names() {
            if children.contains_key(&name) {
                continue;
            }
            let Some(object) = self.module.member(&name) else {
                continue;
            };
            let object = match object {
                Object::Function(function) => Object::Function(function.implementation()),
                other => other.clone(),
            };
            let path = format!("{}.{name}", self.path());
            if let Some(node) = declared_node(&self.intro, path, &object) {
                children.insert(name, node);
            }
        }
    }

    /// The node of sub-module `key`, built once per module node.
    fn imported_submodule(&self, key: &str) -> Option<DocNode> {
        let cached = self
            .imported
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned();
        if cached.is_some() {
            return cached;
        }
        let module = self.intro.importer().import_module(&format!("{}.{key}", self.path()))?;
        let mut imported = self.imported.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let node = imported
            .entry(key.to_string())
            .or_insert_with(|| DocNode::Module(Arc::new(ModuleNode::new(self.intro.clone(), module))));
        Some(node.clone())
    }
}

impl Container for ModuleNode {
    /// The child map first, then a sub-module, then any module attribute.
    fn lookup(&self, key: &str) -> Option<DocNode> {
        if let Some(child) = self.children().get(key) {
            return Some(child.clone());
        }
        if let Some(node) = self.imported_submodule(key) {
            return Some(node);
        }
        let path = format!("{}.{key}", self.path());
        let object = self.module.member(key)?.clone();
        Some(attribute_node(&self.intro, path, object))
    }

    fn entries(&self) -> Vec<(String, DocNode)> {
        public_entries(self.children())
    }
}
