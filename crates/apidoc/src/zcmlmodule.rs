//! The directive index: every configuration directive known to the
//! application, grouped by namespace.
//!
//! Namespaces are keyed by their URI with `:` and `/` escaped, so that each
//! key is a single URL segment. Directives valid in every namespace live
//! under [`ALL`].

use crate::introspector::Introspector;
use crate::location::{Container, DocNode, DocumentationModule};
use object_model::wellknown::ZOPE_NS;
use object_model::{DirectiveEntry, DirectiveKind, Interface, Object, RegistrationInfo};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Key of the namespace holding directives valid everywhere.
pub const ALL: &str = "ALL";

/// Escape a namespace URI into a single URL segment.
pub fn quote_ns(uri: &str) -> String {
    if uri.is_empty() {
        return ALL.to_string();
    }
    uri.replace(':', "_co_").replace('/', "_sl_")
}

pub fn unquote_ns(key: &str) -> String {
    if key == ALL {
        return String::new();
    }
    key.replace("_sl_", "/").replace("_co_", ":")
}

/// The namespace URI a key stands for: a full URI, an escaped one or a
/// short name of a standard namespace.
pub fn full_namespace(key: &str) -> String {
    let uri = unquote_ns(key);
    if uri.is_empty() || uri.contains(':') || uri.contains('/') {
        uri
    } else {
        format!("{ZOPE_NS}{uri}")
    }
}

/// Short name of a namespace: standard namespaces lose their common prefix.
pub fn short_namespace(uri: &str) -> String {
    if uri.is_empty() {
        return ALL.to_string();
    }
    match uri.strip_prefix(ZOPE_NS) {
        Some(short) if !short.is_empty() => short.trim_end_matches('/').to_string(),
        _ => uri.to_string(),
    }
}

type Namespaces = BTreeMap<String, Arc<NamespaceNode>>;

pub struct ZcmlModule {
    intro: Arc<Introspector>,
    namespaces: OnceLock<Namespaces>,
}

impl ZcmlModule {
    pub fn new(intro: Arc<Introspector>) -> Self {
        Self {
            intro,
            namespaces: OnceLock::new(),
        }
    }

    /// Namespaces by URI; the empty URI is that of [`ALL`].
    fn namespaces(&self) -> &Namespaces {
        self.namespaces.get_or_init(|| {
            let context = self.intro.context();
            let subdirs = context.subdirectives();
            context
                .directives()
                .iter()
                .map(|(uri, names)| {
                    let directives = names
                        .iter()
                        .map(|(name, entry)| {
                            let subdirectives = subdirs
                                .get(&(uri.clone(), name.clone()))
                                .cloned()
                                .unwrap_or_default();
                            let node = DirectiveSchemaNode::new(entry.clone(), subdirectives);
                            (name.clone(), Arc::new(node))
                        })
                        .collect();
                    let node = NamespaceNode {
                        uri: uri.clone(),
                        directives,
                    };
                    (uri.clone(), Arc::new(node))
                })
                .collect()
        })
    }
}

impl Container for ZcmlModule {
    fn lookup(&self, key: &str) -> Option<DocNode> {
        let uri = full_namespace(key);
        self.namespaces()
            .get(&uri)
            .map(|namespace| DocNode::Namespace(namespace.clone()))
    }

    fn entries(&self) -> Vec<(String, DocNode)> {
        let mut entries: Vec<(String, DocNode)> = self
            .namespaces()
            .iter()
            .map(|(uri, node)| (quote_ns(uri), DocNode::Namespace(node.clone())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl DocumentationModule for ZcmlModule {
    fn title(&self) -> &str {
        "ZCML Reference"
    }

    fn description(&self) -> &str {
        "This module presents you with a complete list of configuration \
         directives and serves therefore well as a reference. The menu \
         provides you with a tree that organizes the directives by namespace."
    }
}

/// The directives of one namespace.
pub struct NamespaceNode {
    uri: String,
    directives: BTreeMap<String, Arc<DirectiveSchemaNode>>,
}

impl NamespaceNode {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn short_name(&self) -> String {
        short_namespace(&self.uri)
    }

    pub fn quoted_name(&self) -> String {
        quote_ns(&self.uri)
    }
}

impl Container for NamespaceNode {
    fn lookup(&self, key: &str) -> Option<DocNode> {
        self.directives
            .get(key)
            .map(|directive| DocNode::DirectiveSchema(directive.clone()))
    }

    fn entries(&self) -> Vec<(String, DocNode)> {
        self.directives
            .iter()
            .map(|(name, directive)| (name.clone(), DocNode::DirectiveSchema(directive.clone())))
            .collect()
    }
}

/// A registered directive with its sub-directives.
pub struct DirectiveSchemaNode {
    entry: DirectiveEntry,
    subdirectives: Vec<DirectiveEntry>,
}

impl DirectiveSchemaNode {
    pub fn new(entry: DirectiveEntry, subdirectives: Vec<DirectiveEntry>) -> Self {
        Self { entry, subdirectives }
    }

    pub fn entry(&self) -> &DirectiveEntry {
        &self.entry
    }

    pub fn namespace(&self) -> &str {
        &self.entry.namespace
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn kind(&self) -> DirectiveKind {
        self.entry.kind
    }

    pub fn schema(&self) -> &Arc<Interface> {
        &self.entry.schema
    }

    pub fn handler_path(&self) -> Option<&str> {
        self.entry.handler_path.as_deref()
    }

    pub fn handler(&self) -> Option<&Object> {
        self.entry.handler.as_ref()
    }

    pub fn info(&self) -> &RegistrationInfo {
        &self.entry.info
    }

    pub fn used_in(&self) -> Option<&Arc<Interface>> {
        self.entry.used_in.as_ref()
    }

    pub fn subdirectives(&self) -> &[DirectiveEntry] {
        &self.subdirectives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Located;
    use crate::test_support::{importer, sample_tree, settings};
    use object_model::wellknown::META_NS;
    use object_model::{ComponentRegistry, ConfigurationContext};

    const BROWSER_NS: &str = "http://namespaces.zope.org/browser";

    fn zcml_root() -> Arc<Located> {
        let dir = sample_tree();
        let importer = importer(&dir);
        let mut context = ConfigurationContext::new(importer.clone());
        let ipage = Interface::builder("pkg.metadirectives", "IPageDirective").build();
        let imenu = Interface::builder("pkg.metadirectives", "IMenuDirective").build();
        let iitem = Interface::builder("pkg.metadirectives", "IMenuItemSubdirective").build();
        context.register_directive(DirectiveEntry::new(BROWSER_NS, "page", DirectiveKind::Simple, ipage));
        context.register_directive(DirectiveEntry::new(BROWSER_NS, "menu", DirectiveKind::Complex, imenu));
        context.register_subdirective(
            BROWSER_NS,
            "menu",
            DirectiveEntry::new(BROWSER_NS, "item", DirectiveKind::Subdirective, iitem),
        );
        context.register_directive(DirectiveEntry::new(
            "http://example.com/custom",
            "thing",
            DirectiveKind::Simple,
            Interface::builder("pkg.metadirectives", "IThing").build(),
        ));
        let intro = Introspector::new(importer, Arc::new(context), Arc::new(ComponentRegistry::new()))
            .with_settings(settings(&dir));
        Located::root("ZCML", DocNode::Zcml(Arc::new(ZcmlModule::new(Arc::new(intro)))))
    }

    #[test]
    fn test_namespace_keys() {
        assert_eq!(quote_ns(BROWSER_NS), "http_co__sl__sl_namespaces.zope.org_sl_browser");
        assert_eq!(unquote_ns(&quote_ns(BROWSER_NS)), BROWSER_NS);
        assert_eq!(quote_ns(""), ALL);
        assert_eq!(full_namespace("browser"), BROWSER_NS);
        assert_eq!(full_namespace(ALL), "");
        assert_eq!(full_namespace(BROWSER_NS), BROWSER_NS);
        assert_eq!(short_namespace(BROWSER_NS), "browser");
        assert_eq!(short_namespace("http://example.com/custom"), "http://example.com/custom");
        assert_eq!(short_namespace(""), ALL);
    }

    #[test]
    fn test_namespaces_are_listed_escaped() {
        let root = zcml_root();
        assert_eq!(
            root.keys(),
            vec![
                ALL.to_string(),
                quote_ns("http://example.com/custom"),
                quote_ns(BROWSER_NS),
                quote_ns(META_NS),
            ]
        );
    }

    #[test]
    fn test_lookup_accepts_every_key_form() {
        let root = zcml_root();
        for key in [BROWSER_NS.to_string(), quote_ns(BROWSER_NS), "browser".to_string()] {
            let namespace = root.get(&key).unwrap();
            let DocNode::Namespace(node) = namespace.node() else {
                panic!("expected a namespace");
            };
            assert_eq!(node.uri(), BROWSER_NS);
            assert_eq!(node.short_name(), "browser");
            assert_eq!(namespace.name(), key);
        }
        let all = root.index(ALL).unwrap();
        assert_eq!(all.keys(), vec!["configure", "exclude", "include", "includeOverrides"]);
        assert!(root.get("missing").is_none());
    }

    #[test]
    fn test_directive_schemas_carry_subdirectives() {
        let root = zcml_root();
        let menu = root.traverse("browser/menu").unwrap();
        let DocNode::DirectiveSchema(node) = menu.node() else {
            panic!("expected a directive");
        };
        assert_eq!(node.kind(), DirectiveKind::Complex);
        assert_eq!(node.schema().path(), "pkg.metadirectives.IMenuDirective");
        let subdirectives: Vec<&str> = node.subdirectives().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(subdirectives, vec!["item"]);

        let page = root.traverse("browser/page").unwrap();
        let DocNode::DirectiveSchema(page) = page.node() else {
            panic!("expected a directive");
        };
        assert!(page.subdirectives().is_empty());
        assert_eq!(root.traverse("browser").unwrap().keys(), vec!["menu", "page"]);
    }
}
