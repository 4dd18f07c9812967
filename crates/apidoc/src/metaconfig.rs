//! Building the configuration context from meta configuration files.
//!
//! Meta files declare directives (`meta:directive`, `meta:complexDirective`
//! and friends) and features (`meta:provides`). They are read with the same
//! non-executing parser as every other configuration file; `include`
//! directives are followed, each file at most once.

use crate::errors::Result;
use crate::zcml::{Directive, parse_file};
use object_model::context::absolute_name;
use object_model::wellknown::META_NS;
use object_model::{ConfigurationContext, DirectiveEntry, DirectiveKind, Object, RegistrationInfo};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What loading meta configuration added to the context.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetaReport {
    pub files: usize,
    pub directives: usize,
    pub features: usize,
    pub skipped: usize,
}

/// Load a meta configuration file and the files it includes into `context`.
///
/// Only the top file has to parse; broken included files are skipped.
pub fn load_meta_file(
    context: &mut ConfigurationContext,
    path: &Path,
    package: Option<&str>,
) -> Result<MetaReport> {
    let mut loader = MetaLoader {
        context,
        visited: HashSet::new(),
        report: MetaReport::default(),
    };
    let root = parse_file(path, &*loader.context, package)?;
    loader.visited.insert(normalized(path));
    loader.report.files += 1;
    loader.walk(&root, path, None);
    info!(
        "Loaded {} directives and {} features from {} meta files",
        loader.report.directives, loader.report.features, loader.report.files
    );
    Ok(loader.report)
}

fn normalized(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

struct MetaLoader<'a> {
    context: &'a mut ConfigurationContext,
    visited: HashSet<PathBuf>,
    report: MetaReport,
}

impl MetaLoader<'_> {
    fn walk(&mut self, directive: &Directive, file: &Path, namespace: Option<&str>) {
        if directive.name.namespace == META_NS {
            match directive.name.name.as_str() {
                "directive" => self.register(directive, namespace, DirectiveKind::Simple),
                "groupingDirective" => self.register(directive, namespace, DirectiveKind::Grouping),
                "complexDirective" => self.register(directive, namespace, DirectiveKind::Complex),
                "directives" => {
                    let namespace = directive.attr("namespace").or(namespace);
                    for child in directive.directives() {
                        self.walk(child, file, namespace);
                    }
                }
                "provides" => match directive.attr("feature") {
                    Some(feature) => {
                        self.context.provide_feature(feature.trim());
                        self.report.features += 1;
                    }
                    None => self.skip(directive, "`provides` without a feature"),
                },
                other => debug!("Ignoring meta directive `{other}`"),
            }
            return;
        }
        match directive.name.name.as_str() {
            "configure" => {
                for child in directive.directives() {
                    self.walk(child, file, namespace);
                }
            }
            "include" => self.include(directive, file),
            _ => {}
        }
    }

    fn entry(&mut self, directive: &Directive, namespace: Option<&str>, kind: DirectiveKind) -> Option<DirectiveEntry> {
        let namespace = directive.attr("namespace").or(namespace).unwrap_or_default();
        let Some(name) = directive.attr("name") else {
            self.skip(directive, "directive without a name");
            return None;
        };
        let package = directive.package.as_deref();
        let schema = directive
            .attr("schema")
            .and_then(|schema| self.context.resolve_in(package, schema));
        let Some(Object::Interface(schema)) = schema else {
            self.skip(directive, &format!("schema of `{name}` cannot be resolved"));
            return None;
        };
        let mut entry = DirectiveEntry::new(namespace.trim(), name.trim(), kind, schema)
            .with_info(RegistrationInfo::Parser(directive.info.clone()));
        if let Some(handler) = directive.attr("handler") {
            let resolved = self.context.resolve_in(package, handler);
            if resolved.is_none() {
                debug!("Handler `{handler}` of `{name}` cannot be resolved");
            }
            let path = absolute_name(package, handler.trim()).unwrap_or_else(|| handler.trim().to_string());
            entry = entry.with_handler(path, resolved);
        }
        if let Some(used_in) = directive.attr("usedIn") {
            match self.context.resolve_in(package, used_in) {
                Some(Object::Interface(iface)) => entry = entry.used_in(iface),
                _ => debug!("`usedIn` interface `{used_in}` of `{name}` cannot be resolved"),
            }
        }
        Some(entry)
    }

    fn register(&mut self, directive: &Directive, namespace: Option<&str>, kind: DirectiveKind) {
        let Some(entry) = self.entry(directive, namespace, kind) else {
            return;
        };
        let (parent_namespace, parent_name) = (entry.namespace.clone(), entry.name.clone());
        self.context.register_directive(entry);
        self.report.directives += 1;

        if kind != DirectiveKind::Complex {
            return;
        }
        for child in directive.directives() {
            if child.name.namespace != META_NS || child.name.name != "subdirective" {
                continue;
            }
            let Some(subdirective) = self.entry(child, Some(&parent_namespace), DirectiveKind::Subdirective) else {
                continue;
            };
            self.context
                .register_subdirective(&parent_namespace, &parent_name, subdirective);
            self.report.directives += 1;
        }
    }

    fn include(&mut self, directive: &Directive, file: &Path) {
        let package = directive.package.as_deref();
        let (dir, included_package) = match directive.attr("package") {
            Some(dotted) => {
                let Some(absolute) = absolute_name(package, dotted.trim()) else {
                    self.skip(directive, &format!("relative package `{dotted}` outside a package"));
                    return;
                };
                let dir = self
                    .context
                    .importer()
                    .import_module(&absolute)
                    .filter(|module| module.is_package())
                    .and_then(|module| module.file().and_then(Path::parent).map(Path::to_path_buf));
                let Some(dir) = dir else {
                    self.skip(directive, &format!("package `{absolute}` cannot be imported"));
                    return;
                };
                (dir, Some(absolute))
            }
            None => (
                file.parent().map(Path::to_path_buf).unwrap_or_default(),
                package.map(str::to_string),
            ),
        };
        let path = dir.join(directive.attr("file").unwrap_or("meta.zcml").trim());
        if !self.visited.insert(normalized(&path)) {
            return;
        }
        match parse_file(&path, &*self.context, included_package.as_deref()) {
            Ok(root) => {
                self.report.files += 1;
                self.walk(&root, &path, None);
            }
            Err(e) => {
                warn!("Skipping included meta configuration: {e}");
                self.report.skipped += 1;
            }
        }
    }

    fn skip(&mut self, directive: &Directive, reason: &str) {
        warn!(
            "Skipping {} at {}:{}: {reason}",
            directive.full_tag_name(),
            directive.info.file.display(),
            directive.info.line
        );
        self.report.skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{importer, sample_tree, write};
    use crate::zcml::parse;
    use object_model::wellknown::ZOPE_NS;

    const BROWSER_NS: &str = "http://namespaces.zope.org/browser";

    fn meta_tree() -> tempfile::TempDir {
        let dir = sample_tree();
        let root = dir.path();
        write(
            root,
            "pkg/metadirectives.py",
            r#"from zope.interface import Interface
from zope.configuration.fields import GlobalObject, GlobalInterface
from zope.schema import TextLine

class IPageDirective(Interface):
    """Register a page."""

    for_ = GlobalInterface(title=u"The interface the page is for")
    name = TextLine(title=u"Name")
    class_ = GlobalObject(title=u"Class", required=False)

class IMenuDirective(Interface):
    """Define a menu."""

    id = TextLine(title=u"Id")

class IMenuItemSubdirective(Interface):
    """A menu item."""

    action = TextLine(title=u"Action")
"#,
        );
        write(root, "pkg/metaconfigure.py", "def page(_context, for_, name, class_=None):\n    pass\n");
        write(
            root,
            "pkg/meta.zcml",
            r#"<configure xmlns="http://namespaces.zope.org/zope"
           xmlns:meta="http://namespaces.zope.org/meta">
  <meta:directives namespace="http://namespaces.zope.org/browser">
    <meta:directive name="page" schema=".metadirectives.IPageDirective"
                    handler=".metaconfigure.page" />
    <meta:complexDirective name="menu" schema=".metadirectives.IMenuDirective"
                           handler=".metaconfigure.Menu">
      <meta:subdirective name="item" schema=".metadirectives.IMenuItemSubdirective" />
    </meta:complexDirective>
  </meta:directives>
  <meta:provides feature="devmode" />
  <meta:directive namespace="http://namespaces.zope.org/browser" name="broken"
                  schema=".metadirectives.IMissing" />
  <include package=".sub" />
  <include file="meta.zcml" />
</configure>
"#,
        );
        write(
            root,
            "pkg/sub/meta.zcml",
            r#"<configure xmlns:meta="http://namespaces.zope.org/meta">
  <meta:directive namespace="http://namespaces.zope.org/zope" name="widget"
                  schema="pkg.metadirectives.IMenuDirective" />
</configure>
"#,
        );
        dir
    }

    #[test]
    fn test_directives_and_features_are_registered() {
        let dir = meta_tree();
        let mut context = ConfigurationContext::new(importer(&dir));
        let report = load_meta_file(&mut context, &dir.path().join("pkg/meta.zcml"), Some("pkg")).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.directives, 4);
        assert_eq!(report.features, 1);
        assert_eq!(report.skipped, 1);
        assert!(context.has_feature("devmode"));

        let page = context.lookup_directive(BROWSER_NS, "page").unwrap();
        assert_eq!(page.kind, DirectiveKind::Simple);
        assert_eq!(page.schema.path(), "pkg.metadirectives.IPageDirective");
        assert_eq!(page.handler_path.as_deref(), Some("pkg.metaconfigure.page"));
        assert!(page.handler.is_some());
        assert!(matches!(&page.info, RegistrationInfo::Parser(info) if info.line == 4));

        let menu = context.lookup_directive(BROWSER_NS, "menu").unwrap();
        assert_eq!(menu.kind, DirectiveKind::Complex);
        assert!(menu.handler.is_none());
        let item = context.lookup_subdirective(BROWSER_NS, "menu", BROWSER_NS, "item").unwrap();
        assert_eq!(item.kind, DirectiveKind::Subdirective);

        let widget = context.lookup_directive(&format!("{ZOPE_NS}zope"), "widget").unwrap();
        assert_eq!(widget.schema.path(), "pkg.metadirectives.IMenuDirective");
        assert!(context.lookup_directive(BROWSER_NS, "broken").is_none());
    }

    #[test]
    fn test_loaded_schemas_drive_the_parser() {
        let dir = meta_tree();
        let mut context = ConfigurationContext::new(importer(&dir));
        load_meta_file(&mut context, &dir.path().join("pkg/meta.zcml"), Some("pkg")).unwrap();

        let source = r#"<configure xmlns:browser="http://namespaces.zope.org/browser">
  <browser:menu id="main"><browser:item action="index.html" /></browser:menu>
</configure>"#;
        let root = parse(source, Path::new("configure.zcml"), &context, Some("pkg")).unwrap();
        let menu = root.directives().next().unwrap();
        assert_eq!(
            menu.entry.as_ref().map(|e| e.schema.path()).as_deref(),
            Some("pkg.metadirectives.IMenuDirective")
        );
        let item = menu.directives().next().unwrap();
        assert_eq!(
            item.entry.as_ref().map(|e| e.schema.path()).as_deref(),
            Some("pkg.metadirectives.IMenuItemSubdirective")
        );
    }

    #[test]
    fn test_unparsable_top_file_is_an_error() {
        let dir = sample_tree();
        let mut context = ConfigurationContext::new(importer(&dir));
        let error = load_meta_file(&mut context, &dir.path().join("pkg/broken.zcml"), Some("pkg"));
        assert!(error.is_err());
        let missing = load_meta_file(&mut context, &dir.path().join("pkg/missing.zcml"), Some("pkg"));
        assert!(missing.is_err());
    }
}
