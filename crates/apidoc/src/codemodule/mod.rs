//! The code browser: a lazily built tree of packages, modules, classes,
//! functions, interfaces and the text and configuration files shipped in
//! packages.
//!
//! Every class node registers its class in the [`ClassRegistry`] when it
//! is created, which is what lets interface pages list implementations.
//!
//! [`ClassRegistry`]: crate::classregistry::ClassRegistry

mod class;
mod files;
mod function;
mod module;

#[cfg(test)]
mod tests;

use crate::introspector::Introspector;
use crate::location::{Container, DocNode, DocumentationModule};
use object_model::Object;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

pub use class::{ClassMember, ClassNode};
pub use files::{TextFileNode, ZcmlFileNode};
pub use function::FunctionNode;
pub use module::ModuleNode;

/// Files and directories never shown in the code browser.
pub const IGNORE_FILES: [&str; 11] = [
    "tests",
    "tests.py",
    "ftests",
    "ftests.py",
    "CVS",
    ".svn",
    ".git",
    "__pycache__",
    "setup.py",
    "introspection.py",
    "Mount.py",
];

pub struct CodeModule {
    intro: Arc<Introspector>,
    children: OnceLock<BTreeMap<String, DocNode>>,
    imported: RwLock<BTreeMap<String, DocNode>>,
}

impl CodeModule {
    pub fn new(intro: Arc<Introspector>) -> Self {
        Self {
            intro,
            children: OnceLock::new(),
            imported: RwLock::new(BTreeMap::new()),
        }
    }

    fn children(&self) -> &BTreeMap<String, DocNode> {
        self.children.get_or_init(|| {
            let mut children = BTreeMap::new();
            for root in &self.intro.settings().roots {
                match self.intro.importer().import_module(root) {
                    Some(module) => {
                        let node = ModuleNode::new(self.intro.clone(), module);
                        children.insert(root.clone(), DocNode::Module(Arc::new(node)));
                    }
                    None => debug!("Root module `{root}` cannot be imported"),
                }
            }
            children
        })
    }
}

impl Container for CodeModule {
    fn lookup(&self, key: &str) -> Option<DocNode> {
        if let Some(child) = self.children().get(key) {
            return Some(child.clone());
        }
        if !self.intro.settings().import_unknown_modules {
            return None;
        }
        if let Some(node) = self.imported.read().unwrap_or_else(|poisoned| poisoned.into_inner()).get(key) {
            return Some(node.clone());
        }
        let module = self.intro.importer().import_module(key)?;
        let mut imported = self.imported.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let node = imported
            .entry(key.to_string())
            .or_insert_with(|| DocNode::Module(Arc::new(ModuleNode::new(self.intro.clone(), module))));
        Some(node.clone())
    }

    fn entries(&self) -> Vec<(String, DocNode)> {
        public_entries(self.children())
    }
}

impl DocumentationModule for CodeModule {
    fn title(&self) -> &str {
        "Code Browser"
    }

    fn description(&self) -> &str {
        "This module allows you to get an overview of the modules and classes \
         defined in the application, as well as the text and configuration \
         files shipped with its packages."
    }
}

fn public_entries(children: &BTreeMap<String, DocNode>) -> Vec<(String, DocNode)> {
    children
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, node)| (key.clone(), node.clone()))
        .collect()
}

/// Documentation node of a class, function or interface defined in a
/// module; `None` for any other kind of object.
fn declared_node(intro: &Arc<Introspector>, path: String, object: &Object) -> Option<DocNode> {
    match object {
        Object::Class(class) => Some(DocNode::Class(Arc::new(ClassNode::new(intro, path, class.clone())))),
        Object::Function(function) => Some(DocNode::Function(Arc::new(FunctionNode::new(
            path,
            function.implementation(),
        )))),
        Object::Interface(iface) => Some(DocNode::Interface(iface.clone())),
        _ => None,
    }
}

/// Documentation node for an arbitrary module attribute.
fn attribute_node(intro: &Arc<Introspector>, path: String, object: Object) -> DocNode {
    if let Some(node) = declared_node(intro, path, &object) {
        return node;
    }
    match object {
        Object::Module(module) => DocNode::Module(Arc::new(ModuleNode::new(intro.clone(), module))),
        other => DocNode::Object(other),
    }
}
