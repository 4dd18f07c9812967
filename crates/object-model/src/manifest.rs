//! JSON registration manifests.
//!
//! Configuration is never executed, so the component registry of an
//! application is described by a manifest naming interfaces and factories
//! by dotted path. Entries that do not resolve are skipped with a warning.

use crate::checker::{Checker, Permission};
use crate::errors::{ObjectModelError, Result};
use crate::importer::{Importer, resolve};
use crate::interface::Interface;
use crate::object::{Factory, Instance, Object};
use crate::registry::{ComponentRegistry, ParserInfo, RegistrationInfo};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ManifestInfo {
    Text(String),
    Parser {
        file: PathBuf,
        line: usize,
        #[serde(default)]
        column: usize,
        eline: Option<usize>,
        ecolumn: Option<usize>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdapterEntry {
    /// `null` entries stand for "any object".
    pub required: Vec<Option<String>>,
    pub provided: String,
    pub factory: String,
    #[serde(default)]
    pub name: String,
    pub info: Option<ManifestInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerEntry {
    pub required: Vec<Option<String>>,
    pub factory: String,
    pub info: Option<ManifestInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UtilityEntry {
    pub provided: String,
    pub component: String,
    #[serde(default)]
    pub name: String,
    /// Register an instance of the named class instead of the class itself.
    #[serde(default)]
    pub instance: bool,
    pub info: Option<ManifestInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactoryEntry {
    pub factory: String,
    /// Defaults to the factory path.
    pub name: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub interfaces: Vec<String>,
    pub info: Option<ManifestInfo>,
}

/// Read and write permissions of a class, by attribute name.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckerEntry {
    pub class: String,
    #[serde(default)]
    pub get: BTreeMap<String, String>,
    #[serde(default)]
    pub set: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryManifest {
    pub interfaces: Vec<String>,
    pub adapters: Vec<AdapterEntry>,
    pub subscribers: Vec<AdapterEntry>,
    pub handlers: Vec<HandlerEntry>,
    pub utilities: Vec<UtilityEntry>,
    pub factories: Vec<FactoryEntry>,
    pub checkers: Vec<CheckerEntry>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Outcome of applying a manifest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub registered: usize,
    pub skipped: usize,
}

impl RegistryManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ObjectModelError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut manifest: RegistryManifest =
            serde_json::from_str(&content).map_err(|e| ObjectModelError::Manifest {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Register every resolvable entry into `registry`.
    ///
    /// Interfaces named by adapters and utilities are registered as
    /// interface utilities too.
    pub fn apply(&self, registry: &mut ComponentRegistry, importer: &dyn Importer) -> ApplyReport {
        let mut applier = Applier {
            importer,
            base_dir: &self.base_dir,
            seen_interfaces: HashSet::new(),
            report: ApplyReport::default(),
        };

        for path in &self.interfaces {
            match applier.interface(path) {
                Ok(iface) => applier.provide_interface(registry, &iface),
                Err(e) => applier.skip(e),
            }
        }
        for entry in &self.adapters {
            match applier.adapter(registry, entry, false) {
                Ok(()) => applier.report.registered += 1,
                Err(e) => applier.skip(e),
            }
        }
        for entry in &self.subscribers {
            match applier.adapter(registry, entry, true) {
                Ok(()) => applier.report.registered += 1,
                Err(e) => applier.skip(e),
            }
        }
        for entry in &self.handlers {
            match applier.handler(registry, entry) {
                Ok(()) => applier.report.registered += 1,
                Err(e) => applier.skip(e),
            }
        }
        for entry in &self.utilities {
            match applier.utility(registry, entry) {
                Ok(()) => applier.report.registered += 1,
                Err(e) => applier.skip(e),
            }
        }
        for entry in &self.factories {
            match applier.factory(registry, entry) {
                Ok(()) => applier.report.registered += 1,
                Err(e) => applier.skip(e),
            }
        }

        for entry in &self.checkers {
            match applier.checker(registry, entry) {
                Ok(()) => applier.report.registered += 1,
                Err(e) => applier.skip(e),
            }
        }

        debug!(
            "Applied registration manifest: {} registered, {} skipped",
            applier.report.registered, applier.report.skipped
        );
        applier.report
    }
}

struct Applier<'a> {
    importer: &'a dyn Importer,
    base_dir: &'a Path,
    seen_interfaces: HashSet<String>,
    report: ApplyReport,
}

impl Applier<'_> {
    fn skip(&mut self, error: ObjectModelError) {
        warn!("Skipping registration: {error}");
        self.report.skipped += 1;
    }

    fn object(&self, path: &str) -> Result<Object> {
        resolve(self.importer, path).ok_or_else(|| ObjectModelError::Unresolved(path.to_string()))
    }

    fn interface(&self, path: &str) -> Result<Arc<Interface>> {
        match self.object(path)? {
            Object::Interface(iface) => Ok(iface),
            _ => Err(ObjectModelError::WrongKind {
                path: path.to_string(),
                expected: "interface",
            }),
        }
    }

    fn required(&mut self, registry: &mut ComponentRegistry, required: &[Option<String>]) -> Result<Vec<Option<Arc<Interface>>>> {
        let mut resolved = Vec::with_capacity(required.len());
        for entry in required {
            match entry {
                Some(path) => {
                    let iface = self.interface(path)?;
                    self.provide_interface(registry, &iface);
                    resolved.push(Some(iface));
                }
                None => resolved.push(None),
            }
        }
        Ok(resolved)
    }

    fn provide_interface(&mut self, registry: &mut ComponentRegistry, iface: &Arc<Interface>) {
        if self.seen_interfaces.insert(iface.path()) {
            registry.register_interface(iface.clone(), RegistrationInfo::None);
        }
    }

    fn info(&self, info: &Option<ManifestInfo>) -> RegistrationInfo {
        match info {
            None => RegistrationInfo::None,
            Some(ManifestInfo::Text(text)) => RegistrationInfo::Text(text.clone()),
            Some(ManifestInfo::Parser {
                file,
                line,
                column,
                eline,
                ecolumn,
            }) => RegistrationInfo::Parser(ParserInfo {
                file: if file.is_absolute() {
                    file.clone()
                } else {
                    self.base_dir.join(file)
                },
                line: *line,
                column: *column,
                eline: eline.unwrap_or(*line),
                ecolumn: ecolumn.unwrap_or(*column),
            }),
        }
    }

    fn adapter(&mut self, registry: &mut ComponentRegistry, entry: &AdapterEntry, subscriber: bool) -> Result<()> {
        let required = self.required(registry, &entry.required)?;
        let provided = self.interface(&entry.provided)?;
        let factory = self.object(&entry.factory)?;
        self.provide_interface(registry, &provided);
        let info = self.info(&entry.info);
        if subscriber {
            registry.register_subscriber(required, provided, factory, info);
        } else {
            registry.register_adapter(required, provided, factory, entry.name.clone(), info);
        }
        Ok(())
    }

    fn handler(&mut self, registry: &mut ComponentRegistry, entry: &HandlerEntry) -> Result<()> {
        let required = self.required(registry, &entry.required)?;
        let factory = self.object(&entry.factory)?;
        registry.register_handler(required, factory, self.info(&entry.info));
        Ok(())
    }

    fn utility(&mut self, registry: &mut ComponentRegistry, entry: &UtilityEntry) -> Result<()> {
        let provided = self.interface(&entry.provided)?;
        let mut component = self.object(&entry.component)?;
        if entry.instance {
            let Object::Class(class) = component else {
                return Err(ObjectModelError::WrongKind {
                    path: entry.component.clone(),
                    expected: "class",
                });
            };
            component = Object::Instance(Arc::new(Instance::new(class)));
        }
        self.provide_interface(registry, &provided);
        registry.register_utility(provided, component, entry.name.clone(), self.info(&entry.info));
        Ok(())
    }

    fn factory(&mut self, registry: &mut ComponentRegistry, entry: &FactoryEntry) -> Result<()> {
        let callable = self.object(&entry.factory)?;
        let mut factory = Factory::new(callable)
            .with_title(entry.title.clone())
            .with_description(entry.description.clone());
        for path in &entry.interfaces {
            factory = factory.producing(self.interface(path)?);
        }
        if entry.interfaces.is_empty() {
            if let Object::Class(class) = &factory.callable {
                factory.interfaces = class.interfaces();
            }
        }
        let name = entry.name.clone().unwrap_or_else(|| entry.factory.clone());
        registry.register_factory(factory, name, self.info(&entry.info));
        Ok(())
    }

    fn checker(&mut self, registry: &mut ComponentRegistry, entry: &CheckerEntry) -> Result<()> {
        let Object::Class(class) = self.object(&entry.class)? else {
            return Err(ObjectModelError::WrongKind {
                path: entry.class.clone(),
                expected: "class",
            });
        };
        let mut checker = Checker::new();
        for (name, permission) in &entry.get {
            checker = checker.allow_read(name.clone(), Permission::parse(permission));
        }
        for (name, permission) in &entry.set {
            checker = checker.allow_write(name.clone(), Permission::parse(permission));
        }
        registry.define_checker(format!("{}.{}", class.module(), class.qualname()), checker);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::importer::StaticImporter;
    use crate::module::Module;
    use std::io::Write;

    fn importer() -> StaticImporter {
        let ifoo = Interface::builder("pkg.interfaces", "IFoo").build();
        let ibar = Interface::builder("pkg.interfaces", "IBar").build();
        let f = Class::builder("pkg.impl", "F").implements(ifoo.clone()).build();
        StaticImporter::with_builtins()
            .with(
                Module::builder("pkg.interfaces")
                    .member("IFoo", Object::Interface(ifoo))
                    .member("IBar", Object::Interface(ibar))
                    .build(),
            )
            .with(Module::builder("pkg.impl").member("F", Object::Class(f)).build())
    }

    #[test]
    fn test_apply_registers_and_skips() {
        let manifest = RegistryManifest::from_json(
            r#"{
                "adapters": [
                    {"required": ["pkg.interfaces.IBar"], "provided": "pkg.interfaces.IFoo", "factory": "pkg.impl.F",
                     "info": {"file": "configure.zcml", "line": 3, "column": 2}},
                    {"required": ["pkg.interfaces.IMissing"], "provided": "pkg.interfaces.IFoo", "factory": "pkg.impl.F"}
                ],
                "utilities": [
                    {"provided": "pkg.interfaces.IFoo", "component": "pkg.impl.F", "instance": true, "info": "registered in code"}
                ],
                "factories": [{"factory": "pkg.impl.F", "title": "F factory"}],
                "checkers": [{"class": "pkg.impl.F", "get": {"title": "zope.Public"}}]
            }"#,
        )
        .expect("manifest");
        let mut registry = ComponentRegistry::new();
        let report = manifest.apply(&mut registry, &importer());

        assert_eq!(report, ApplyReport { registered: 4, skipped: 1 });
        assert_eq!(registry.adapters().count(), 1);
        let adapter = registry.adapters().next().expect("adapter");
        assert!(matches!(
            &adapter.info,
            RegistrationInfo::Parser(info) if info.line == 3 && info.eline == 3 && info.column == 2
        ));

        let names: Vec<_> = registry.interfaces().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["pkg.interfaces.IBar", "pkg.interfaces.IFoo"]);

        let utility = registry
            .utilities()
            .find(|r| r.factory.kind() == crate::object::ObjectKind::Instance)
            .expect("instance utility");
        assert_eq!(utility.info, RegistrationInfo::Text("registered in code".into()));

        let factory = registry
            .utilities()
            .find_map(|r| match &r.factory {
                Object::Factory(factory) => Some((r.name.clone(), factory.clone())),
                _ => None,
            })
            .expect("factory");
        assert_eq!(factory.0, "pkg.impl.F");
        assert_eq!(factory.1.interfaces.len(), 1);

        let class = adapter.factory.as_class().expect("class factory");
        let checker = registry.checker_for(class).expect("checker");
        assert_eq!(checker.read_permission("title"), Some(&Permission::Public));
    }

    #[test]
    fn test_load_resolves_relative_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("registrations.json");
        let mut file = std::fs::File::create(&path).expect("create");
        write!(
            file,
            r#"{{"handlers": [{{"required": [null], "factory": "pkg.impl.F", "info": {{"file": "x.zcml", "line": 1}}}}]}}"#
        )
        .expect("write");

        let manifest = RegistryManifest::load(&path).expect("load");
        let mut registry = ComponentRegistry::new();
        manifest.apply(&mut registry, &importer());
        let handler = registry.handlers().next().expect("handler");
        match &handler.info {
            RegistrationInfo::Parser(info) => assert_eq!(info.file, dir.path().join("x.zcml")),
            other => panic!("unexpected info {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = RegistryManifest::load(Path::new("/nonexistent/registrations.json"));
        assert!(matches!(result, Err(ObjectModelError::Manifest { .. })));
    }
}
