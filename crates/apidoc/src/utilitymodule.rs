//! The utility index: registered utilities grouped by the interface they
//! provide, then by name.

use crate::component::NONAME;
use crate::introspector::Introspector;
use crate::location::{Container, DocNode, DocumentationModule};
use object_model::{Interface, Registration};
use std::collections::BTreeMap;
use std::sync::Arc;

/// URL key of a utility name.
pub fn encode_name(name: &str) -> &str {
    if name.is_empty() { NONAME } else { name }
}

pub fn decode_name(key: &str) -> &str {
    if key == NONAME { "" } else { key }
}

pub struct UtilityModule {
    intro: Arc<Introspector>,
}

impl UtilityModule {
    pub fn new(intro: Arc<Introspector>) -> Self {
        Self { intro }
    }

    fn interfaces(&self) -> BTreeMap<String, Arc<Interface>> {
        self.intro
            .registry()
            .utilities()
            .filter_map(|registration| registration.provided.clone())
            .map(|iface| (iface.path(), iface))
            .collect()
    }

    fn node(&self, iface: Arc<Interface>) -> DocNode {
        DocNode::UtilityInterface(Arc::new(UtilityInterfaceNode {
            intro: self.intro.clone(),
            iface,
        }))
    }
}

impl Container for UtilityModule {
    fn lookup(&self, key: &str) -> Option<DocNode> {
        let iface = self.interfaces().remove(key)?;
        Some(self.node(iface))
    }

    fn entries(&self) -> Vec<(String, DocNode)> {
        self.interfaces()
            .into_iter()
            .map(|(path, iface)| (path, self.node(iface)))
            .collect()
    }
}

impl DocumentationModule for UtilityModule {
    fn title(&self) -> &str {
        "Utilities"
    }

    fn description(&self) -> &str {
        "Utilities are also nicely registered in a site manager, so that it is \
         easy to create a listing of available utilities. A utility is \
         identified by the providing interface and a name, which can be empty."
    }
}

/// The utilities providing one interface.
pub struct UtilityInterfaceNode {
    intro: Arc<Introspector>,
    iface: Arc<Interface>,
}

impl UtilityInterfaceNode {
    pub fn interface(&self) -> &Arc<Interface> {
        &self.iface
    }

    fn utilities(&self) -> impl Iterator<Item = &Registration> {
        self.intro.registry().utilities().filter(|registration| {
            registration
                .provided
                .as_deref()
                .is_some_and(|provided| provided == self.iface.as_ref())
        })
    }

    fn node(&self, registration: &Registration) -> DocNode {
        DocNode::Utility(Arc::new(UtilityNode {
            registration: registration.clone(),
        }))
    }
}

impl Container for UtilityInterfaceNode {
    fn lookup(&self, key: &str) -> Option<DocNode> {
        let name = decode_name(key);
        self.utilities()
            .find(|registration| registration.name == name)
            .map(|registration| self.node(registration))
    }

    fn entries(&self) -> Vec<(String, DocNode)> {
        let mut entries: Vec<(String, DocNode)> = self
            .utilities()
            .map(|registration| (encode_name(&registration.name).to_string(), self.node(registration)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// One utility registration.
pub struct UtilityNode {
    registration: Registration,
}

impl UtilityNode {
    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn name(&self) -> &str {
        &self.registration.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Located;
    use crate::test_support::{introspector_with, sample_tree};
    use object_model::{Class, ComponentRegistry, Object, RegistrationInfo};

    #[test]
    fn test_utilities_grouped_by_interface_and_name() {
        let dir = sample_tree();
        let ifoo = Interface::builder("tests.interfaces", "IFoo").build();
        let ibar = Interface::builder("tests.interfaces", "IBar").build();
        let a = Object::Class(Class::builder("pkg.sub.foo", "A").build());
        let mut registry = ComponentRegistry::new();
        registry.register_utility(ifoo.clone(), a.clone(), "", RegistrationInfo::None);
        registry.register_utility(ifoo.clone(), a.clone(), "named", RegistrationInfo::None);
        registry.register_utility(ibar, a, "other", RegistrationInfo::None);
        let intro = introspector_with(&dir, registry);
        let root = Located::root("Utility", DocNode::Utilities(Arc::new(UtilityModule::new(intro))));

        assert_eq!(root.keys(), vec!["tests.interfaces.IBar", "tests.interfaces.IFoo"]);
        let foo = root.index("tests.interfaces.IFoo").unwrap();
        assert_eq!(foo.keys(), vec![NONAME, "named"]);

        let unnamed = foo.index(NONAME).unwrap();
        let DocNode::Utility(utility) = unnamed.node() else {
            panic!("expected a utility");
        };
        assert_eq!(utility.name(), "");
        assert!(root.traverse("tests.interfaces.IBar/named").is_none());
        assert!(root.get("tests.interfaces.IMissing").is_none());
    }
}
