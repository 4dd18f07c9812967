//! Views: plain, serializable records prepared from documentation nodes.
//!
//! Every page of the documentation browser is a [`Page`]: the location of
//! a node, its children and the details specific to its kind. Templates
//! and the static exporter only ever see these records.

mod class;
mod code;
mod iface;
mod zcml;


pub use class::{ClassAttribute, ClassDetails, ClassMethod};
pub use code::{FunctionDetails, ModuleDetails, ModuleEntry, ObjectDetails, TextFileDetails};
pub use iface::{FieldDetails, InterfaceAttribute, InterfaceDetails, InterfaceMethod, ViewBucket};
pub use zcml::{
    DirectiveAttribute, DirectiveChild, DirectiveDetails, DirectiveSchemaDetails, Reference, SubdirectiveDetails,
    ZcmlFileDetails,
};

use crate::component::{UtilityDetails, code_url, interface_url};
use crate::introspector::Introspector;
use crate::location::{DocNode, Located};
use crate::utilities::{DocFormat, get_path, render_text};
use object_model::{Interface, Object};
use serde::Serialize;
use std::sync::Arc;

/// A dotted path and, when it can be linked to, its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub path: String,
    pub url: Option<String>,
}

impl Link {
    pub fn code(intro: &Introspector, path: impl Into<String>) -> Self {
        let path = path.into();
        let url = code_url(intro, &path);
        Self { path, url }
    }

    pub fn interface(intro: &Introspector, iface: &Interface) -> Self {
        let path = iface.path();
        let url = intro
            .settings()
            .modules
            .iter()
            .any(|module| module == "Interface")
            .then(|| interface_url(intro, &path));
        Self { path, url }
    }

    /// Link to the page documenting `object`.
    pub fn object(intro: &Introspector, object: &Object) -> Option<Self> {
        match object {
            Object::Interface(iface) => Some(Link::interface(intro, iface)),
            other => get_path(other).map(|path| Link::code(intro, path)),
        }
    }
}

/// Render documentation text of an object defined in `module`, honoring
/// the module's `__docformat__`.
pub(crate) fn render_doc(intro: &Introspector, text: &str, module: &str) -> String {
    let format = intro
        .importer()
        .import_module(module)
        .map(|module| DocFormat::from_docformat(module.docformat()))
        .unwrap_or_default();
    render_text(intro.renderer(), text, format)
}

/// First paragraph line of a docstring.
pub(crate) fn summary(doc: &str) -> String {
    doc.trim().lines().next().unwrap_or_default().trim().to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct Crumb {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildLink {
    pub name: String,
    pub url: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    pub key: String,
    pub title: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RootDetails {
    pub modules: Vec<ModuleSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UtilityPageDetails {
    pub interface: Link,
    #[serde(flatten)]
    pub utility: UtilityDetails,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Details {
    Root(RootDetails),
    /// Containers without details of their own.
    Listing,
    Module(ModuleDetails),
    Class(ClassDetails),
    Function(FunctionDetails),
    TextFile(TextFileDetails),
    ZcmlFile(ZcmlFileDetails),
    Interface(Box<InterfaceDetails>),
    Utility(UtilityPageDetails),
    DirectiveSchema(DirectiveSchemaDetails),
    Object(ObjectDetails),
}

/// Everything a page shows about one located node.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: String,
    pub kind: &'static str,
    pub url: String,
    pub breadcrumbs: Vec<Crumb>,
    pub children: Vec<ChildLink>,
    pub details: Details,
}

impl Page {
    pub fn new(intro: &Introspector, located: &Arc<Located>) -> Self {
        let base_url = intro.settings().base_url.as_str();
        let mut breadcrumbs = Vec::new();
        let mut current = Some(located);
        while let Some(location) = current {
            breadcrumbs.push(Crumb {
                name: location.name().to_string(),
                url: location.url(base_url),
            });
            current = location.parent();
        }
        breadcrumbs.reverse();

        let children = located
            .items()
            .into_iter()
            .map(|(name, child)| ChildLink {
                url: child.url(base_url),
                kind: child.node().kind(),
                name,
            })
            .collect();

        let title = match located.node().as_documentation_module() {
            Some(module) => module.title().to_string(),
            None => located.name().to_string(),
        };

        Self {
            title,
            kind: located.node().kind(),
            url: located.url(base_url),
            breadcrumbs,
            children,
            details: details(intro, located),
        }
    }
}

fn details(intro: &Introspector, located: &Arc<Located>) -> Details {
    let base_url = intro.settings().base_url.as_str();
    match located.node() {
        DocNode::Root(_) => Details::Root(RootDetails {
            modules: located
                .items()
                .into_iter()
                .filter_map(|(key, child)| {
                    let module = child.node().as_documentation_module()?;
                    Some(ModuleSummary {
                        title: module.title().to_string(),
                        description: render_text(intro.renderer(), module.description(), DocFormat::Restructured),
                        url: child.url(base_url),
                        key,
                    })
                })
                .collect(),
        }),
        DocNode::Module(module) => Details::Module(ModuleDetails::new(intro, module, located)),
        DocNode::Class(class) => Details::Class(ClassDetails::new(intro, class)),
        DocNode::Function(function) => Details::Function(FunctionDetails::new(intro, function)),
        DocNode::TextFile(file) => Details::TextFile(TextFileDetails::new(intro, file)),
        DocNode::ZcmlFile(file) => Details::ZcmlFile(ZcmlFileDetails::new(intro, file)),
        DocNode::Interface(iface) => Details::Interface(Box::new(InterfaceDetails::new(intro, iface))),
        DocNode::Utility(utility) => {
            let registration = utility.registration();
            Details::Utility(UtilityPageDetails {
                interface: match &registration.provided {
                    Some(iface) => Link::interface(intro, iface),
                    None => Link {
                        path: String::new(),
                        url: None,
                    },
                },
                utility: UtilityDetails::new(intro, registration),
            })
        }
        DocNode::DirectiveSchema(directive) => {
            Details::DirectiveSchema(DirectiveSchemaDetails::new(intro, directive))
        }
        DocNode::Object(object) => Details::Object(ObjectDetails::new(intro, object, located)),
        DocNode::Code(_)
        | DocNode::Interfaces(_)
        | DocNode::Utilities(_)
        | DocNode::UtilityInterface(_)
        | DocNode::Zcml(_)
        | DocNode::Namespace(_) => Details::Listing,
    }
}
