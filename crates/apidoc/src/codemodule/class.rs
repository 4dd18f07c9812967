use crate::introspector::Introspector;
use crate::utilities::{InterfaceSource, get_interface_for_attribute, get_public_attributes};
use object_model::{Checker, Class, Function, Interface, Object};
use std::sync::Arc;

/// A public attribute of a class, with the interface declaring it.
#[derive(Debug, Clone)]
pub struct ClassMember {
    pub name: String,
    pub object: Object,
    pub interface: Option<Arc<Interface>>,
}

/// A class of the code browser.
pub struct ClassNode {
    intro: Arc<Introspector>,
    path: String,
    class: Arc<Class>,
}

impl ClassNode {
    /// Create the node and register the class under `path`.
    pub fn new(intro: &Arc<Introspector>, path: impl Into<String>, class: Arc<Class>) -> Self {
        let path = path.into();
        intro.classes().insert(path.clone(), class.clone());
        Self {
            intro: intro.clone(),
            path,
            class,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    pub fn doc(&self) -> &str {
        self.class.doc()
    }

    pub fn bases(&self) -> &[Arc<Class>] {
        self.class.bases()
    }

    /// Subclasses registered so far, sorted by path.
    pub fn known_subclasses(&self) -> Vec<(String, Arc<Class>)> {
        self.intro.classes().subclasses_of(&self.class)
    }

    /// Interfaces declared on the class itself.
    pub fn direct_interfaces(&self) -> &[Arc<Interface>] {
        self.class.direct_interfaces()
    }

    /// Every interface implemented, inherited declarations included.
    pub fn interfaces(&self) -> Vec<Arc<Interface>> {
        self.class.interfaces()
    }

    /// Public attributes that are not methods.
    pub fn attributes(&self) -> Vec<ClassMember> {
        self.members()
            .into_iter()
            .filter(|member| !matches!(member.object, Object::Function(_)))
            .collect()
    }

    pub fn methods(&self) -> Vec<ClassMember> {
        self.members()
            .into_iter()
            .filter(|member| matches!(&member.object, Object::Function(f) if !f.builtin))
            .collect()
    }

    /// Methods implemented natively.
    pub fn method_descriptors(&self) -> Vec<ClassMember> {
        self.members()
            .into_iter()
            .filter(|member| matches!(&member.object, Object::Function(f) if f.builtin))
            .collect()
    }

    pub fn constructor(&self) -> Option<Arc<Function>> {
        self.class.constructor()
    }

    pub fn security_checker(&self) -> Option<Arc<Checker>> {
        self.intro.registry().checker_for(&self.class)
    }

    fn members(&self) -> Vec<ClassMember> {
        get_public_attributes(&Object::Class(self.class.clone()))
            .into_iter()
            .filter_map(|name| {
                let object = self.class.attribute(&name)?;
                let interface = get_interface_for_attribute(&name, InterfaceSource::Class(&self.class));
                Some(ClassMember {
                    name,
                    object,
                    interface,
                })
            })
            .collect()
    }
}
