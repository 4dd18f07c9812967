//! The component registry: adapters, subscribers, handlers and utilities.
//!
//! Registrations are kept in registration order. Utilities are keyed by
//! `(provided, name)`; registering the same key twice replaces the earlier
//! component in place.

use crate::checker::Checker;
use crate::class::Class;
use crate::interface::Interface;
use crate::object::{Factory, Object};
use crate::wellknown;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationKind {
    Adapter,
    Subscriber,
    Handler,
    Utility,
}

/// Source position of a configuration directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserInfo {
    pub file: PathBuf,
    /// 1-based.
    pub line: usize,
    /// 0-based.
    pub column: usize,
    pub eline: usize,
    pub ecolumn: usize,
}

/// Where a registration was declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegistrationInfo {
    #[default]
    None,
    Text(String),
    Parser(ParserInfo),
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub kind: RegistrationKind,
    /// Absent for handlers.
    pub provided: Option<Arc<Interface>>,
    /// `None` entries stand for "any object"; empty for utilities.
    pub required: Vec<Option<Arc<Interface>>>,
    /// The factory, or the component itself for utilities.
    pub factory: Object,
    pub name: String,
    pub info: RegistrationInfo,
}

#[derive(Debug, Default)]
pub struct ComponentRegistry {
    registrations: Vec<Registration>,
    /// Security checkers declared for classes, by class path.
    checkers: FxHashMap<String, Arc<Checker>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_adapter(
        &mut self,
        required: Vec<Option<Arc<Interface>>>,
        provided: Arc<Interface>,
        factory: Object,
        name: impl Into<String>,
        info: RegistrationInfo,
    ) {
        self.registrations.push(Registration {
            kind: RegistrationKind::Adapter,
            provided: Some(provided),
            required,
            factory,
            name: name.into(),
            info,
        });
    }

    pub fn register_subscriber(
        &mut self,
        required: Vec<Option<Arc<Interface>>>,
        provided: Arc<Interface>,
        factory: Object,
        info: RegistrationInfo,
    ) {
        self.registrations.push(Registration {
            kind: RegistrationKind::Subscriber,
            provided: Some(provided),
            required,
            factory,
            name: String::new(),
            info,
        });
    }

    pub fn register_handler(
        &mut self,
        required: Vec<Option<Arc<Interface>>>,
        factory: Object,
        info: RegistrationInfo,
    ) {
        self.registrations.push(Registration {
            kind: RegistrationKind::Handler,
            provided: None,
            required,
            factory,
            name: String::new(),
            info,
        });
    }

    pub fn register_utility(
        &mut self,
        provided: Arc<Interface>,
        component: Object,
        name: impl Into<String>,
        info: RegistrationInfo,
    ) {
        let name = name.into();
        let registration = Registration {
            kind: RegistrationKind::Utility,
            provided: Some(provided.clone()),
            required: Vec::new(),
            factory: component,
            name,
            info,
        };
        let existing = self.registrations.iter_mut().find(|existing| {
            existing.kind == RegistrationKind::Utility
                && existing.name == registration.name
                && existing
                    .provided
                    .as_ref()
                    .is_some_and(|p| p.as_ref() == provided.as_ref())
        });
        match existing {
            Some(slot) => *slot = registration,
            None => self.registrations.push(registration),
        }
    }

    /// Register a factory utility under `name`.
    pub fn register_factory(&mut self, factory: Factory, name: impl Into<String>, info: RegistrationInfo) {
        self.register_utility(
            wellknown::ifactory(),
            Object::Factory(Arc::new(factory)),
            name,
            info,
        );
    }

    /// Register an interface as an `IInterface` utility named by its path.
    pub fn register_interface(&mut self, iface: Arc<Interface>, info: RegistrationInfo) {
        let name = iface.path();
        self.register_utility(wellknown::iinterface(), Object::Interface(iface), name, info);
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    fn of_kind(&self, kind: RegistrationKind) -> impl Iterator<Item = &Registration> {
        self.registrations.iter().filter(move |r| r.kind == kind)
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Registration> {
        self.of_kind(RegistrationKind::Adapter)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = &Registration> {
        self.of_kind(RegistrationKind::Subscriber)
    }

    pub fn handlers(&self) -> impl Iterator<Item = &Registration> {
        self.of_kind(RegistrationKind::Handler)
    }

    pub fn utilities(&self) -> impl Iterator<Item = &Registration> {
        self.of_kind(RegistrationKind::Utility)
    }

    /// Utilities whose provided interface is or extends `iface`.
    pub fn utilities_for<'a, 'b>(&'a self, iface: &'b Interface) -> impl Iterator<Item = &'a Registration> {
        self.utilities().filter(move |r| {
            r.provided
                .as_ref()
                .is_some_and(|provided| provided.is_or_extends(iface))
        })
    }

    pub fn query_utility(&self, provided: &Interface, name: &str) -> Option<&Registration> {
        self.utilities().find(|r| {
            r.name == name && r.provided.as_ref().is_some_and(|p| p.as_ref() == provided)
        })
    }

    /// Every interface registered as an `IInterface` utility, keyed by name.
    pub fn interfaces(&self) -> Vec<(String, Arc<Interface>)> {
        let meta = wellknown::iinterface();
        self.utilities_for(&meta)
            .filter_map(|r| r.factory.as_interface().map(|i| (r.name.clone(), i.clone())))
            .collect()
    }

    pub fn define_checker(&mut self, class_path: impl Into<String>, checker: Checker) {
        self.checkers.insert(class_path.into(), Arc::new(checker));
    }

    /// The checker of a class: its own, or one declared for its path.
    pub fn checker_for(&self, class: &Class) -> Option<Arc<Checker>> {
        class.checker().cloned().or_else(|| {
            self.checkers
                .get(&format!("{}.{}", class.module(), class.qualname()))
                .cloned()
        })
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Permission;

    #[test]
    fn test_checker_lookup() {
        let own = Class::builder("pkg", "Own")
            .checker(Checker::new().allow_read("a", Permission::Public))
            .build();
        let declared = Class::builder("pkg", "Declared").build();
        let mut registry = ComponentRegistry::new();
        registry.define_checker("pkg.Declared", Checker::new().allow_write("a", Permission::Public));

        assert!(registry.checker_for(&own).is_some_and(|c| c.read_permission("a").is_some()));
        assert!(registry.checker_for(&declared).is_some_and(|c| c.write_permission("a").is_some()));
        assert!(registry.checker_for(&Class::builder("pkg", "Other").build()).is_none());
    }

    #[test]
    fn test_utility_registration_replaces_same_key() {
        let iface = Interface::builder("pkg", "IUtil").build();
        let a = Class::builder("pkg", "A").build();
        let b = Class::builder("pkg", "B").build();
        let mut registry = ComponentRegistry::new();
        registry.register_utility(iface.clone(), Object::Class(a), "", RegistrationInfo::None);
        registry.register_utility(iface.clone(), Object::Class(b), "", RegistrationInfo::None);
        registry.register_utility(
            iface.clone(),
            Object::value("1", "int"),
            "named",
            RegistrationInfo::Text("declared in code".into()),
        );

        assert_eq!(registry.utilities().count(), 2);
        let unnamed = registry.query_utility(&iface, "").expect("unnamed utility");
        assert_eq!(unnamed.factory.name().as_deref(), Some("B"));
    }

    fn utilities_of<'a>(registry: &'a ComponentRegistry, module: &str, name: &str) -> Vec<&'a Registration> {
        let iface = Interface::builder(module, name).build();
        registry.utilities_for(&iface).collect()
    }

    #[test]
    fn test_utilities_outlive_the_queried_interface() {
        let iface = Interface::builder("pkg", "IUtil").build();
        let mut registry = ComponentRegistry::new();
        registry.register_utility(iface, Object::value("1", "int"), "one", RegistrationInfo::None);

        let found = utilities_of(&registry, "pkg", "IUtil");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "one");
        assert!(utilities_of(&registry, "pkg", "IOther").is_empty());
    }

    #[test]
    fn test_interfaces_are_listed() {
        let ifoo = Interface::builder("pkg", "IFoo").build();
        let mut registry = ComponentRegistry::new();
        registry.register_interface(ifoo.clone(), RegistrationInfo::None);

        let interfaces = registry.interfaces();
        assert_eq!(interfaces.len(), 1);
        assert_eq!(interfaces[0].0, "pkg.IFoo");
        assert!(Arc::ptr_eq(&interfaces[0].1, &ifoo));
    }

    #[test]
    fn test_kinds_are_separated() {
        let ifoo = Interface::builder("pkg", "IFoo").build();
        let ibar = Interface::builder("pkg", "IBar").build();
        let factory = Object::Class(Class::builder("pkg", "F").build());
        let mut registry = ComponentRegistry::new();
        registry.register_adapter(vec![Some(ibar.clone())], ifoo.clone(), factory.clone(), "", RegistrationInfo::None);
        registry.register_subscriber(vec![Some(ibar.clone())], ifoo.clone(), factory.clone(), RegistrationInfo::None);
        registry.register_handler(vec![None], factory, RegistrationInfo::None);

        assert_eq!(registry.adapters().count(), 1);
        assert_eq!(registry.subscribers().count(), 1);
        assert_eq!(registry.handlers().count(), 1);
        assert_eq!(registry.utilities().count(), 0);
        assert_eq!(registry.len(), 3);
    }
}
