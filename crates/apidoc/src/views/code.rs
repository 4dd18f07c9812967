use super::{Link, render_doc, summary};
use crate::codemodule::{FunctionNode, ModuleNode, TextFileNode};
use crate::introspector::Introspector;
use crate::location::{DocNode, Located};
use crate::utilities::{columnize, render_text};
use object_model::Object;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A child of a module, as listed on the module page.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleEntry {
    pub name: String,
    pub url: String,
    pub kind: &'static str,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleDetails {
    pub path: String,
    pub file: Option<String>,
    pub is_package: bool,
    pub doc: String,
    pub declared_interfaces: Vec<Link>,
    /// Children split into three columns.
    pub columns: Vec<Vec<ModuleEntry>>,
}

impl ModuleDetails {
    pub fn new(intro: &Introspector, node: &ModuleNode, located: &Arc<Located>) -> Self {
        let base_url = intro.settings().base_url.as_str();
        let entries = located
            .items()
            .into_iter()
            .map(|(name, child)| ModuleEntry {
                url: child.url(base_url),
                kind: child.node().kind(),
                summary: summary(&node_doc(child.node())),
                name,
            })
            .collect();
        Self {
            path: node.path().to_string(),
            file: node
                .file_name()
                .and_then(|file| intro.settings().relative_source_path(file)),
            is_package: node.is_package(),
            doc: render_doc(intro, node.doc(), node.path()),
            declared_interfaces: node
                .declared_interfaces()
                .iter()
                .map(|iface| Link::interface(intro, iface))
                .collect(),
            columns: columnize(entries, 3),
        }
    }
}

fn node_doc(node: &DocNode) -> String {
    match node {
        DocNode::Module(module) => module.doc().to_string(),
        DocNode::Class(class) => class.doc().to_string(),
        DocNode::Function(function) => function.doc().to_string(),
        DocNode::Interface(iface) => iface.doc().to_string(),
        DocNode::Object(object) => object.doc(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDetails {
    pub path: String,
    pub signature: String,
    pub doc: String,
    pub attributes: BTreeMap<String, String>,
}

impl FunctionDetails {
    pub fn new(intro: &Introspector, node: &FunctionNode) -> Self {
        Self {
            path: node.path().to_string(),
            signature: node.signature(),
            doc: render_doc(intro, node.doc(), &node.function().module),
            attributes: node.attributes().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TextFileDetails {
    pub file: String,
    pub format: String,
    pub content: String,
}

impl TextFileDetails {
    pub fn new(intro: &Introspector, node: &TextFileNode) -> Self {
        let format = node.format();
        Self {
            file: node.path().display().to_string(),
            format: format.to_string(),
            content: render_text(intro.renderer(), &node.content(), format),
        }
    }
}

/// Any other module attribute: a value, an instance or a factory.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectDetails {
    pub name: String,
    pub kind: String,
    pub value: String,
    pub type_name: String,
    pub type_link: Option<Link>,
    pub doc: String,
    pub interfaces: Vec<Link>,
}

impl ObjectDetails {
    pub fn new(intro: &Introspector, object: &Object, located: &Located) -> Self {
        let module = object.module_path().unwrap_or_default();
        Self {
            name: located.name().to_string(),
            kind: object.kind().to_string().to_lowercase(),
            value: object.repr(),
            type_name: object.type_name(),
            type_link: object.type_path().map(|path| Link::code(intro, path)),
            doc: render_doc(intro, &object.doc(), &module),
            interfaces: object
                .provided_interfaces()
                .iter()
                .map(|iface| Link::interface(intro, iface))
                .collect(),
        }
    }
}
