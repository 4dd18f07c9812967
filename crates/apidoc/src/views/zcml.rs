use super::{Link, render_doc};
use super::iface::{FieldDetails, schema_fields};
use crate::codemodule::ZcmlFileNode;
use crate::component::{ParserInfoDetails, registration_source};
use crate::introspector::Introspector;
use crate::zcml::{Directive, ZcmlChild};
use crate::zcmlmodule::{DirectiveSchemaNode, quote_ns, short_namespace};
use object_model::{DirectiveEntry, DirectiveKind};
use serde::Serialize;

/// One token of an attribute value and the page of the object it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub token: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectiveAttribute {
    pub name: String,
    pub value: String,
    /// Set for attributes that name other objects.
    pub references: Option<Vec<Reference>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectiveChild {
    Directive(DirectiveDetails),
    Comment { text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectiveDetails {
    pub tag: String,
    pub namespace: String,
    pub name: String,
    /// Page of the directive in the ZCML reference; sub-directives link to
    /// their parent directive.
    pub schema_url: Option<String>,
    pub line: usize,
    pub column: usize,
    pub eline: usize,
    pub ecolumn: usize,
    pub attributes: Vec<DirectiveAttribute>,
    pub children: Vec<DirectiveChild>,
}

impl DirectiveDetails {
    pub fn new(intro: &Introspector, directive: &Directive) -> Self {
        Self::with_parent(intro, directive, None)
    }

    fn with_parent(intro: &Introspector, directive: &Directive, parent: Option<&Directive>) -> Self {
        let schema_url = directive.entry.as_ref().and_then(|entry| {
            let documented = match (entry.kind, parent) {
                (DirectiveKind::Subdirective, Some(parent)) => parent.entry.as_ref()?,
                _ => entry,
            };
            directive_url(intro, documented)
        });
        let children = directive
            .children
            .iter()
            .map(|child| match child {
                ZcmlChild::Directive(child) => {
                    DirectiveChild::Directive(DirectiveDetails::with_parent(intro, child, Some(directive)))
                }
                ZcmlChild::Comment(text) => DirectiveChild::Comment { text: text.clone() },
            })
            .collect();
        Self {
            tag: directive.full_tag_name(),
            namespace: directive.name.namespace.clone(),
            name: directive.name.name.clone(),
            schema_url,
            line: directive.info.line,
            column: directive.info.column,
            eline: directive.info.eline,
            ecolumn: directive.info.ecolumn,
            attributes: attributes(intro, directive),
            children,
        }
    }
}

fn directive_url(intro: &Introspector, entry: &DirectiveEntry) -> Option<String> {
    let enabled = intro.settings().modules.iter().any(|module| module == "ZCML");
    enabled.then(|| {
        format!(
            "{}/ZCML/{}/{}",
            intro.settings().base_url.trim_end_matches('/'),
            quote_ns(&entry.namespace),
            entry.name
        )
    })
}

/// Attributes in the order the schema declares them; attributes the schema
/// does not know follow in document order.
fn attributes(intro: &Introspector, directive: &Directive) -> Vec<DirectiveAttribute> {
    let position = |name: &str| {
        let field = directive.field(name)?;
        let schema = &directive.entry.as_ref()?.schema;
        schema.fields().iter().position(|candidate| candidate.name == field.name)
    };
    let mut attrs: Vec<(Option<usize>, &(String, String))> = directive
        .attrs
        .iter()
        .map(|attr| (position(&attr.0), attr))
        .collect();
    attrs.sort_by_key(|(position, _)| position.unwrap_or(usize::MAX));

    attrs
        .into_iter()
        .map(|(_, (name, value))| DirectiveAttribute {
            references: directive
                .references(intro.context(), name, value)
                .map(|tokens| {
                    tokens
                        .into_iter()
                        .map(|(token, object)| Reference {
                            url: object.as_ref().and_then(|object| Link::object(intro, object)?.url),
                            token,
                        })
                        .collect()
                }),
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

/// A configuration file with its directive tree.
#[derive(Debug, Clone, Serialize)]
pub struct ZcmlFileDetails {
    pub file: String,
    pub url: Option<String>,
    pub package: String,
    pub root: Option<DirectiveDetails>,
    /// Why the file could not be parsed.
    pub error: Option<String>,
    /// Raw text, kept for files that fail to parse.
    pub source: String,
}

impl ZcmlFileDetails {
    pub fn new(intro: &Introspector, node: &ZcmlFileNode) -> Self {
        let (root, error) = match node.parse() {
            Ok(root) => (Some(DirectiveDetails::new(intro, &root)), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            file: node.path().display().to_string(),
            url: intro.settings().relative_source_path(node.path()),
            package: node.package().to_string(),
            root,
            error,
            source: node.content(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubdirectiveDetails {
    pub namespace: String,
    pub name: String,
    pub schema: Link,
    pub doc: String,
    pub fields: Vec<FieldDetails>,
    pub handler: Option<Link>,
    pub info: Option<String>,
    pub zcml: Option<ParserInfoDetails>,
}

impl SubdirectiveDetails {
    pub fn new(intro: &Introspector, entry: &DirectiveEntry) -> Self {
        let (info, zcml) = registration_source(intro, &entry.info);
        Self {
            namespace: entry.namespace.clone(),
            name: entry.name.clone(),
            schema: Link::interface(intro, &entry.schema),
            doc: render_doc(intro, entry.schema.doc(), entry.schema.module()),
            fields: schema_fields(intro, &entry.schema),
            handler: entry.handler_path.as_deref().map(|path| Link::code(intro, path)),
            info,
            zcml,
        }
    }
}

/// A page of the ZCML reference.
#[derive(Debug, Clone, Serialize)]
pub struct DirectiveSchemaDetails {
    pub short_namespace: String,
    pub kind: String,
    #[serde(flatten)]
    pub directive: SubdirectiveDetails,
    pub used_in: Option<Link>,
    pub subdirectives: Vec<SubdirectiveDetails>,
}

impl DirectiveSchemaDetails {
    pub fn new(intro: &Introspector, node: &DirectiveSchemaNode) -> Self {
        Self {
            short_namespace: short_namespace(node.namespace()),
            kind: node.kind().to_string(),
            directive: SubdirectiveDetails::new(intro, node.entry()),
            used_in: node.used_in().map(|iface| Link::interface(intro, iface)),
            subdirectives: node
                .subdirectives()
                .iter()
                .map(|sub| SubdirectiveDetails::new(intro, sub))
                .collect(),
        }
    }
}
