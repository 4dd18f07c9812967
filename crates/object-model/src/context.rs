//! The configuration context: a read-only snapshot of every directive the
//! application knows, captured at boot.
//!
//! Directives are registered per namespace; the empty namespace holds
//! directives valid in every namespace. Complex directives additionally own
//! sub-directives, keyed by the parent's `(namespace, name)`.

use crate::importer::{Importer, resolve};
use crate::interface::Interface;
use crate::object::Object;
use crate::registry::RegistrationInfo;
use crate::schema::{Field, FieldKind, SimpleField};
use crate::wellknown;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DirectiveKind {
    Simple,
    Grouping,
    Complex,
    Subdirective,
}

/// One registered directive or sub-directive.
#[derive(Debug, Clone)]
pub struct DirectiveEntry {
    pub namespace: String,
    pub name: String,
    pub kind: DirectiveKind,
    pub schema: Arc<Interface>,
    /// The handler as written in the registering configuration.
    pub handler_path: Option<String>,
    pub handler: Option<Object>,
    pub info: RegistrationInfo,
    /// Interface of the context the directive may be used in.
    pub used_in: Option<Arc<Interface>>,
}

impl DirectiveEntry {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        kind: DirectiveKind,
        schema: Arc<Interface>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            schema,
            handler_path: None,
            handler: None,
            info: RegistrationInfo::None,
            used_in: None,
        }
    }

    pub fn with_handler(mut self, path: impl Into<String>, handler: Option<Object>) -> Self {
        self.handler_path = Some(path.into());
        self.handler = handler;
        self
    }

    pub fn with_info(mut self, info: RegistrationInfo) -> Self {
        self.info = info;
        self
    }

    pub fn used_in(mut self, iface: Arc<Interface>) -> Self {
        self.used_in = Some(iface);
        self
    }
}

type Namespaces = BTreeMap<String, BTreeMap<String, DirectiveEntry>>;

pub struct ConfigurationContext {
    importer: Arc<dyn Importer>,
    directives: Namespaces,
    subdirectives: BTreeMap<(String, String), Vec<DirectiveEntry>>,
    features: BTreeSet<String>,
}

impl std::fmt::Debug for ConfigurationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationContext")
            .field("directives", &self.directives.keys().collect::<Vec<_>>())
            .field("features", &self.features)
            .finish()
    }
}

impl ConfigurationContext {
    /// A context holding only the core and meta directives.
    pub fn new(importer: Arc<dyn Importer>) -> Self {
        let mut context = Self {
            importer,
            directives: BTreeMap::new(),
            subdirectives: BTreeMap::new(),
            features: BTreeSet::new(),
        };
        context.register_core_directives();
        context
    }

    pub fn importer(&self) -> &Arc<dyn Importer> {
        &self.importer
    }

    pub fn register_directive(&mut self, entry: DirectiveEntry) {
        self.directives
            .entry(entry.namespace.clone())
            .or_default()
            .insert(entry.name.clone(), entry);
    }

    pub fn register_subdirective(&mut self, parent_namespace: &str, parent_name: &str, entry: DirectiveEntry) {
        let subdirs = self
            .subdirectives
            .entry((parent_namespace.to_string(), parent_name.to_string()))
            .or_default();
        subdirs.retain(|existing| !(existing.namespace == entry.namespace && existing.name == entry.name));
        subdirs.push(entry);
    }

    pub fn provide_feature(&mut self, feature: impl Into<String>) {
        self.features.insert(feature.into());
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    pub fn features(&self) -> impl Iterator<Item = &String> {
        self.features.iter()
    }

    /// Top-level directive lookup: the exact namespace first, then the
    /// directives registered for every namespace.
    pub fn lookup_directive(&self, namespace: &str, name: &str) -> Option<&DirectiveEntry> {
        self.directives
            .get(namespace)
            .and_then(|names| names.get(name))
            .or_else(|| self.directives.get("").and_then(|names| names.get(name)))
    }

    pub fn lookup_subdirective(
        &self,
        parent_namespace: &str,
        parent_name: &str,
        namespace: &str,
        name: &str,
    ) -> Option<&DirectiveEntry> {
        self.subdirectives
            .get(&(parent_namespace.to_string(), parent_name.to_string()))?
            .iter()
            .find(|entry| entry.name == name && (entry.namespace == namespace || entry.namespace.is_empty()))
    }

    /// All registered directives: namespace to name to entry, sorted.
    pub fn directives(&self) -> &BTreeMap<String, BTreeMap<String, DirectiveEntry>> {
        &self.directives
    }

    pub fn subdirectives(&self) -> &BTreeMap<(String, String), Vec<DirectiveEntry>> {
        &self.subdirectives
    }

    /// Whether the named package can be imported.
    pub fn installed(&self, package: &str) -> bool {
        self.importer.import_module(package).is_some()
    }

    /// Resolve a dotted name, relative names against `package`.
    ///
    /// A leading dot refers to `package`; each further dot goes one
    /// package up.
    pub fn resolve_in(&self, package: Option<&str>, dotted: &str) -> Option<Object> {
        let absolute = absolute_name(package, dotted.trim())?;
        resolve(self.importer.as_ref(), &absolute)
    }

    pub fn resolve(&self, dotted: &str) -> Option<Object> {
        self.resolve_in(None, dotted)
    }

    fn register_core_directives(&mut self) {
        let izope_configure = Interface::builder("zope.configuration.zopeconfigure", "IZopeConfigure")
            .doc("The `configure` directive groups other directives and sets the package they apply to.")
            .field(Field::new("package", FieldKind::GlobalObject).with_title("Package").with_required(false))
            .field(Field::new("i18n_domain", FieldKind::Simple(SimpleField::BytesLine)).with_title("Internationalization domain").with_required(false))
            .build();
        let iinclude = Interface::builder("zope.configuration.xmlconfig", "IInclude")
            .doc("The `include` directive includes configuration from another file.")
            .field(Field::new("file", FieldKind::Simple(SimpleField::BytesLine)).with_title("Configuration file name").with_required(false))
            .field(Field::new("package", FieldKind::GlobalObject).with_title("Include package").with_required(false))
            .field(Field::new("files", FieldKind::Simple(SimpleField::BytesLine)).with_title("Configuration file name pattern").with_required(false))
            .build();
        let iexclude = Interface::builder("zope.configuration.xmlconfig", "IExclude")
            .doc("The `exclude` directive excludes configuration files from later inclusion.")
            .field(Field::new("file", FieldKind::Simple(SimpleField::BytesLine)).with_title("Configuration file name").with_required(false))
            .field(Field::new("package", FieldKind::GlobalObject).with_title("Exclude package").with_required(false))
            .build();
        let core = [
            ("configure", DirectiveKind::Grouping, &izope_configure, "zope.configuration.zopeconfigure.ZopeConfigure"),
            ("include", DirectiveKind::Simple, &iinclude, "zope.configuration.xmlconfig.include"),
            ("includeOverrides", DirectiveKind::Simple, &iinclude, "zope.configuration.xmlconfig.includeOverrides"),
            ("exclude", DirectiveKind::Simple, &iexclude, "zope.configuration.xmlconfig.exclude"),
        ];
        for (name, kind, schema, handler) in core {
            self.register_directive(
                DirectiveEntry::new("", name, kind, schema.clone()).with_handler(handler, None),
            );
        }

        let idirective = Interface::builder("zope.configuration.metadirectives", "IFullInfo")
            .doc("Define a configuration directive.")
            .field(Field::new("namespace", FieldKind::Simple(SimpleField::URI)).with_title("Namespace").with_required(false))
            .field(Field::new("name", FieldKind::Simple(SimpleField::TextLine)).with_title("Directive name"))
            .field(Field::new("schema", FieldKind::GlobalInterface).with_title("Directive handler"))
            .field(Field::new("handler", FieldKind::GlobalObject).with_title("Directive handler").with_required(false))
            .field(Field::new("usedIn", FieldKind::GlobalInterface).with_title("The directive types the directive can be used in").with_required(false))
            .build();
        let idirectives = Interface::builder("zope.configuration.metadirectives", "IDirectivesInfo")
            .doc("Schema for the `directives` directive.")
            .field(Field::new("namespace", FieldKind::Simple(SimpleField::URI)).with_title("Namespace"))
            .build();
        let iprovides = Interface::builder("zope.configuration.metadirectives", "IProvides")
            .doc("Declare that a feature is provided by the configuration.")
            .field(Field::new("feature", FieldKind::Simple(SimpleField::TextLine)).with_title("Feature name"))
            .build();
        let meta = [
            ("directive", DirectiveKind::Simple, &idirective),
            ("groupingDirective", DirectiveKind::Simple, &idirective),
            ("complexDirective", DirectiveKind::Complex, &idirective),
            ("directives", DirectiveKind::Grouping, &idirectives),
            ("provides", DirectiveKind::Simple, &iprovides),
        ];
        for (name, kind, schema) in meta {
            self.register_directive(DirectiveEntry::new(wellknown::META_NS, name, kind, schema.clone()));
        }
        self.register_subdirective(
            wellknown::META_NS,
            "complexDirective",
            DirectiveEntry::new(wellknown::META_NS, "subdirective", DirectiveKind::Subdirective, idirective),
        );
    }
}

/// Turn a possibly relative dotted name into an absolute one.
pub fn absolute_name(package: Option<&str>, dotted: &str) -> Option<String> {
    if !dotted.starts_with('.') {
        return (!dotted.is_empty()).then(|| dotted.to_string());
    }
    let package = package?;
    let rest = dotted.trim_start_matches('.');
    let ups = dotted.len() - rest.len() - 1;
    let mut segments: Vec<&str> = package.split('.').collect();
    if ups >= segments.len() {
        return None;
    }
    segments.truncate(segments.len() - ups);
    if !rest.is_empty() {
        segments.push(rest);
    }
    Some(segments.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::importer::StaticImporter;
    use crate::module::Module;

    fn context() -> ConfigurationContext {
        let class = Class::builder("pkg.sub", "A").build();
        let importer = StaticImporter::with_builtins()
            .with(Module::builder("pkg").build())
            .with(Module::builder("pkg.sub").member("A", Object::Class(class)).build());
        ConfigurationContext::new(Arc::new(importer))
    }

    #[test]
    fn test_absolute_name() {
        assert_eq!(absolute_name(None, "a.b").as_deref(), Some("a.b"));
        assert_eq!(absolute_name(Some("pkg.sub"), ".A").as_deref(), Some("pkg.sub.A"));
        assert_eq!(absolute_name(Some("pkg.sub"), "..other").as_deref(), Some("pkg.other"));
        assert_eq!(absolute_name(Some("pkg.sub"), ".").as_deref(), Some("pkg.sub"));
        assert_eq!(absolute_name(Some("pkg"), "...x"), None);
        assert_eq!(absolute_name(None, ".x"), None);
    }

    #[test]
    fn test_core_directives_in_every_namespace() {
        let context = context();
        let configure = context
            .lookup_directive("http://namespaces.zope.org/browser", "configure")
            .expect("configure directive");
        assert_eq!(configure.kind, DirectiveKind::Grouping);
        assert!(context.lookup_directive("", "include").is_some());
        assert!(context.lookup_directive("http://ns/x", "foo").is_none());
        assert!(
            context
                .lookup_subdirective(wellknown::META_NS, "complexDirective", wellknown::META_NS, "subdirective")
                .is_some()
        );
    }

    #[test]
    fn test_resolution_and_installed() {
        let context = context();
        assert!(context.installed("pkg.sub"));
        assert!(!context.installed("missing"));
        assert!(matches!(context.resolve_in(Some("pkg.sub"), ".A"), Some(Object::Class(_))));
        assert!(context.resolve("pkg.sub.B").is_none());
    }
}
