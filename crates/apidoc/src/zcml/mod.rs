//! Directive trees of configuration files.
//!
//! Files are parsed without executing anything: each element becomes a
//! [`Directive`] carrying the schema registered for it in the configuration
//! context, its raw attributes and its source position. Attributes typed
//! as object references can be resolved to the objects they name.

mod parser;


use object_model::{ConfigurationContext, DirectiveEntry, Field, FieldKind, InterfaceMember, Object, ParserInfo};
use serde::Serialize;
use std::collections::BTreeMap;

pub use parser::{parse, parse_file};

/// Namespace of the attributes that steer the parser, e.g. `zcml:condition`.
pub const ZCML_NS: &str = "http://namespaces.zope.org/zcml";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZcmlChild {
    Directive(Directive),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Directive {
    pub name: QualifiedName,
    /// Namespace URI to prefix, for every binding in scope. On the root
    /// directive these are the bindings the file declares.
    pub prefixes: BTreeMap<String, String>,
    /// The directive as registered in the configuration context.
    pub entry: Option<DirectiveEntry>,
    /// Attributes in document order, namespace declarations excluded.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<ZcmlChild>,
    pub info: ParserInfo,
    /// Package that relative dotted names are resolved against.
    pub package: Option<String>,
}

impl PartialEq for Directive {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.prefixes == other.prefixes
            && self.attrs == other.attrs
            && self.children == other.children
            && self.info == other.info
            && self.package == other.package
            && self.entry.as_ref().map(|e| e.schema.path()) == other.entry.as_ref().map(|e| e.schema.path())
    }
}

impl Directive {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sub-directives, comments skipped.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.children.iter().filter_map(|child| match child {
            ZcmlChild::Directive(directive) => Some(directive),
            ZcmlChild::Comment(_) => None,
        })
    }

    /// Tag name as written with the prefix bound to the namespace.
    pub fn full_tag_name(&self) -> String {
        match self.prefixes.get(&self.name.namespace) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", self.name.name),
            _ => self.name.name.clone(),
        }
    }

    /// Schema field describing an attribute.
    ///
    /// Attributes named like keywords are declared with a trailing
    /// underscore, e.g. `for` is the field `for_`.
    pub fn field(&self, attr: &str) -> Option<&Field> {
        let schema = &self.entry.as_ref()?.schema;
        [attr.to_string(), format!("{attr}_")]
            .iter()
            .find_map(|name| match schema.get(name) {
                Some(InterfaceMember::Field(field)) => Some(field),
                _ => None,
            })
    }

    /// Objects named by an attribute value, one entry per token.
    ///
    /// Returns `None` when the attribute is not an object reference; tokens
    /// that do not resolve map to `None`.
    pub fn references(
        &self,
        context: &ConfigurationContext,
        attr: &str,
        value: &str,
    ) -> Option<Vec<(String, Option<Object>)>> {
        let field = self.field(attr)?;
        if !field.kind.is_object_reference() {
            return None;
        }
        let tokens: Vec<&str> = match &field.kind {
            FieldKind::Tokens(_) => value.split_whitespace().collect(),
            _ => vec![value.trim()],
        };
        Some(
            tokens
                .into_iter()
                .filter(|token| !token.is_empty())
                .map(|token| {
                    let object = if token == "*" {
                        None
                    } else {
                        context.resolve_in(self.package.as_deref(), token)
                    };
                    (token.to_string(), object)
                })
                .collect(),
        )
    }
}
