//! Locations: the `(parent, name)` a documentation node is reached under.
//!
//! Documentation nodes are context free and shared. Every lookup wraps the
//! node it finds into a new [`Located`] bound to the container it was looked
//! up in, so the same node can live under several paths. Wrappers are never
//! cached.

use crate::codemodule::{ClassNode, CodeModule, FunctionNode, ModuleNode, TextFileNode, ZcmlFileNode};
use crate::errors::{ApidocError, Result};
use crate::ifacemodule::InterfaceModule;
use crate::root::RootContainer;
use crate::utilitymodule::{UtilityInterfaceNode, UtilityModule, UtilityNode};
use crate::zcmlmodule::{DirectiveSchemaNode, NamespaceNode, ZcmlModule};
use object_model::{Interface, Object};
use std::sync::Arc;

/// Read-only hierarchical lookup.
pub trait Container: Send + Sync {
    /// Resolve a key. May find entries that [`entries`](Container::entries)
    /// does not list, e.g. private names.
    fn lookup(&self, key: &str) -> Option<DocNode>;

    /// Listed entries, sorted by key.
    fn entries(&self) -> Vec<(String, DocNode)>;
}

/// A sub-module composed under the documentation root.
pub trait DocumentationModule: Container {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
}

#[derive(Clone)]
pub enum DocNode {
    Root(Arc<RootContainer>),
    Code(Arc<CodeModule>),
    Module(Arc<ModuleNode>),
    Class(Arc<ClassNode>),
    Function(Arc<FunctionNode>),
    TextFile(Arc<TextFileNode>),
    ZcmlFile(Arc<ZcmlFileNode>),
    Interface(Arc<Interface>),
    Interfaces(Arc<InterfaceModule>),
    Utilities(Arc<UtilityModule>),
    UtilityInterface(Arc<UtilityInterfaceNode>),
    Utility(Arc<UtilityNode>),
    Zcml(Arc<ZcmlModule>),
    Namespace(Arc<NamespaceNode>),
    DirectiveSchema(Arc<DirectiveSchemaNode>),
    /// Any other attribute of a module, reached by explicit lookup.
    Object(Object),
}

impl DocNode {
    pub fn kind(&self) -> &'static str {
        match self {
            DocNode::Root(_) => "root",
            DocNode::Code(_) => "code",
            DocNode::Module(_) => "module",
            DocNode::Class(_) => "class",
            DocNode::Function(_) => "function",
            DocNode::TextFile(_) => "textfile",
            DocNode::ZcmlFile(_) => "zcmlfile",
            DocNode::Interface(_) => "interface",
            DocNode::Interfaces(_) => "interfaces",
            DocNode::Utilities(_) => "utilities",
            DocNode::UtilityInterface(_) => "utilityinterface",
            DocNode::Utility(_) => "utility",
            DocNode::Zcml(_) => "zcml",
            DocNode::Namespace(_) => "namespace",
            DocNode::DirectiveSchema(_) => "directive",
            DocNode::Object(_) => "object",
        }
    }

    fn container(&self) -> Option<&dyn Container> {
        match self {
            DocNode::Root(root) => Some(root.as_ref()),
            DocNode::Code(code) => Some(code.as_ref()),
            DocNode::Module(module) => Some(module.as_ref()),
            DocNode::Interfaces(module) => Some(module.as_ref()),
            DocNode::Utilities(module) => Some(module.as_ref()),
            DocNode::UtilityInterface(node) => Some(node.as_ref()),
            DocNode::Zcml(module) => Some(module.as_ref()),
            DocNode::Namespace(node) => Some(node.as_ref()),
            DocNode::Class(_)
            | DocNode::Function(_)
            | DocNode::TextFile(_)
            | DocNode::ZcmlFile(_)
            | DocNode::Interface(_)
            | DocNode::Utility(_)
            | DocNode::DirectiveSchema(_)
            | DocNode::Object(_) => None,
        }
    }

    pub fn as_documentation_module(&self) -> Option<&dyn DocumentationModule> {
        match self {
            DocNode::Code(module) => Some(module.as_ref()),
            DocNode::Interfaces(module) => Some(module.as_ref()),
            DocNode::Utilities(module) => Some(module.as_ref()),
            DocNode::Zcml(module) => Some(module.as_ref()),
            _ => None,
        }
    }

    /// Whether both refer to the same underlying record.
    pub fn same_as(&self, other: &DocNode) -> bool {
        match (self, other) {
            (DocNode::Root(a), DocNode::Root(b)) => Arc::ptr_eq(a, b),
            (DocNode::Code(a), DocNode::Code(b)) => Arc::ptr_eq(a, b),
            (DocNode::Module(a), DocNode::Module(b)) => Arc::ptr_eq(a, b),
            (DocNode::Class(a), DocNode::Class(b)) => Arc::ptr_eq(a, b),
            (DocNode::Function(a), DocNode::Function(b)) => Arc::ptr_eq(a, b),
            (DocNode::TextFile(a), DocNode::TextFile(b)) => Arc::ptr_eq(a, b),
            (DocNode::ZcmlFile(a), DocNode::ZcmlFile(b)) => Arc::ptr_eq(a, b),
            (DocNode::Interface(a), DocNode::Interface(b)) => Arc::ptr_eq(a, b),
            (DocNode::Interfaces(a), DocNode::Interfaces(b)) => Arc::ptr_eq(a, b),
            (DocNode::Utilities(a), DocNode::Utilities(b)) => Arc::ptr_eq(a, b),
            (DocNode::UtilityInterface(a), DocNode::UtilityInterface(b)) => Arc::ptr_eq(a, b),
            (DocNode::Utility(a), DocNode::Utility(b)) => Arc::ptr_eq(a, b),
            (DocNode::Zcml(a), DocNode::Zcml(b)) => Arc::ptr_eq(a, b),
            (DocNode::Namespace(a), DocNode::Namespace(b)) => Arc::ptr_eq(a, b),
            (DocNode::DirectiveSchema(a), DocNode::DirectiveSchema(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for DocNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocNode::{}", self.kind())
    }
}

pub struct Located {
    parent: Option<Arc<Located>>,
    name: String,
    node: DocNode,
}

impl std::fmt::Debug for Located {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Located")
            .field("path", &self.path_segments().join("/"))
            .field("node", &self.node)
            .finish()
    }
}

impl Located {
    pub fn root(name: impl Into<String>, node: DocNode) -> Arc<Located> {
        Arc::new(Located {
            parent: None,
            name: name.into(),
            node,
        })
    }

    pub fn with_parent_and_name(node: DocNode, parent: &Arc<Located>, name: impl Into<String>) -> Arc<Located> {
        Arc::new(Located {
            parent: Some(parent.clone()),
            name: name.into(),
            node,
        })
    }

    pub fn parent(&self) -> Option<&Arc<Located>> {
        self.parent.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &DocNode {
        &self.node
    }

    pub fn get(self: &Arc<Self>, key: &str) -> Option<Arc<Located>> {
        let node = self.node.container()?.lookup(key)?;
        Some(Located::with_parent_and_name(node, self, key))
    }

    /// Like [`get`](Located::get), but a miss is an error.
    pub fn index(self: &Arc<Self>, key: &str) -> Result<Arc<Located>> {
        self.get(key)
            .ok_or_else(|| ApidocError::KeyNotFound(key.to_string()))
    }

    pub fn items(self: &Arc<Self>) -> Vec<(String, Arc<Located>)> {
        let Some(container) = self.node.container() else {
            return Vec::new();
        };
        container
            .entries()
            .into_iter()
            .map(|(key, node)| {
                let located = Located::with_parent_and_name(node, self, key.clone());
                (key, located)
            })
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.node
            .container()
            .map(|container| container.entries().into_iter().map(|(key, _)| key).collect())
            .unwrap_or_default()
    }

    pub fn values(self: &Arc<Self>) -> Vec<Arc<Located>> {
        self.items().into_iter().map(|(_, value)| value).collect()
    }

    pub fn len(&self) -> usize {
        self.node
            .container()
            .map(|container| container.entries().len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.node
            .container()
            .is_some_and(|container| container.lookup(key).is_some())
    }

    /// Descend through `/`-separated segments; empty segments are skipped.
    pub fn traverse(self: &Arc<Self>, path: &str) -> Option<Arc<Located>> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.clone(), |current, segment| current.get(segment))
    }

    /// Names from the root down to this location, the root excluded.
    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = Some(self);
        while let Some(located) = current {
            if located.parent.is_some() {
                segments.push(located.name.clone());
            }
            current = located.parent.as_deref();
        }
        segments.reverse();
        segments
    }

    /// URL of this location below `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let segments = self.path_segments();
        if segments.is_empty() {
            format!("{base}/")
        } else {
            format!("{base}/{}", segments.join("/"))
        }
    }
}
