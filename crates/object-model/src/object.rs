//! The describer capability: every documented value is an [`Object`].

use crate::class::Class;
use crate::function::Function;
use crate::interface::Interface;
use crate::module::Module;
use serde::Serialize;
use std::sync::Arc;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Module,
    Class,
    Function,
    Interface,
    Instance,
    Factory,
    Value,
}

/// A plain value, described by its `repr` and type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Value {
    pub repr: String,
    pub type_name: String,
}

impl Value {
    pub fn new(repr: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            repr: repr.into(),
            type_name: type_name.into(),
        }
    }
}

/// An instance of a class, e.g. a utility component.
#[derive(Debug)]
pub struct Instance {
    pub class: Arc<Class>,
    /// Module and name under which the instance is bound, if any.
    pub module: Option<String>,
    pub name: Option<String>,
    /// Interfaces provided directly by the instance.
    pub provides: Vec<Arc<Interface>>,
}

impl Instance {
    pub fn new(class: Arc<Class>) -> Self {
        Self {
            class,
            module: None,
            name: None,
            provides: Vec::new(),
        }
    }

    pub fn bound_to(mut self, module: impl Into<String>, name: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self.name = Some(name.into());
        self
    }

    pub fn providing(mut self, iface: Arc<Interface>) -> Self {
        self.provides.push(iface);
        self
    }
}

/// A factory component: a callable that announces the interfaces its
/// products provide.
#[derive(Debug)]
pub struct Factory {
    pub callable: Object,
    pub title: String,
    pub description: String,
    pub interfaces: Vec<Arc<Interface>>,
}

impl Factory {
    pub fn new(callable: Object) -> Self {
        Self {
            callable,
            title: String::new(),
            description: String::new(),
            interfaces: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn producing(mut self, iface: Arc<Interface>) -> Self {
        self.interfaces.push(iface);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Object {
    Module(Arc<Module>),
    Class(Arc<Class>),
    Function(Arc<Function>),
    Interface(Arc<Interface>),
    Instance(Arc<Instance>),
    Factory(Arc<Factory>),
    Value(Arc<Value>),
}

impl Object {
    pub fn value(repr: impl Into<String>, type_name: impl Into<String>) -> Self {
        Object::Value(Arc::new(Value::new(repr, type_name)))
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Module(_) => ObjectKind::Module,
            Object::Class(_) => ObjectKind::Class,
            Object::Function(_) => ObjectKind::Function,
            Object::Interface(_) => ObjectKind::Interface,
            Object::Instance(_) => ObjectKind::Instance,
            Object::Factory(_) => ObjectKind::Factory,
            Object::Value(_) => ObjectKind::Value,
        }
    }

    /// The `__module__` of the object, when it has one.
    pub fn module_path(&self) -> Option<String> {
        match self {
            Object::Module(module) => Some(module.path().to_string()),
            Object::Class(class) => Some(class.module().to_string()),
            Object::Function(function) => Some(function.module.clone()),
            Object::Interface(iface) => Some(iface.module().to_string()),
            Object::Instance(instance) => Some(instance.class.module().to_string()),
            Object::Factory(_) | Object::Value(_) => None,
        }
    }

    /// The `__name__` of the object, when it has one.
    pub fn name(&self) -> Option<String> {
        match self {
            Object::Module(module) => Some(module.path().to_string()),
            Object::Class(class) => Some(class.name().to_string()),
            Object::Function(function) => Some(function.name().to_string()),
            Object::Interface(iface) => Some(iface.name().to_string()),
            Object::Instance(_) | Object::Factory(_) | Object::Value(_) => None,
        }
    }

    pub fn doc(&self) -> String {
        match self {
            Object::Module(module) => module.doc().to_string(),
            Object::Class(class) => class.doc().to_string(),
            Object::Function(function) => function.doc.clone(),
            Object::Interface(iface) => iface.doc().to_string(),
            Object::Instance(instance) => instance.class.doc().to_string(),
            Object::Factory(factory) => factory.description.clone(),
            Object::Value(_) => String::new(),
        }
    }

    /// Name of the object's type, as shown next to attribute values.
    pub fn type_name(&self) -> String {
        match self {
            Object::Module(_) => "module".to_string(),
            Object::Class(_) => "type".to_string(),
            Object::Function(function) if function.builtin => "method_descriptor".to_string(),
            Object::Function(_) => "function".to_string(),
            Object::Interface(_) => "InterfaceClass".to_string(),
            Object::Instance(instance) => instance.class.name().to_string(),
            Object::Factory(_) => "Factory".to_string(),
            Object::Value(value) => value.type_name.clone(),
        }
    }

    /// Dotted path of the object's type, when the type is itself documented.
    pub fn type_path(&self) -> Option<String> {
        match self {
            Object::Instance(instance) => Some(format!(
                "{}.{}",
                instance.class.module(),
                instance.class.name()
            )),
            Object::Interface(_) => Some("zope.interface.interface.InterfaceClass".to_string()),
            Object::Factory(_) => Some("zope.component.factory.Factory".to_string()),
            _ => None,
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Object::Module(module) => format!("<module '{}'>", module.path()),
            Object::Class(class) => format!("<class '{}.{}'>", class.module(), class.qualname()),
            Object::Function(function) => {
                format!("<function {}>", function.qualname)
            }
            Object::Interface(iface) => format!("<InterfaceClass {}>", iface.path()),
            Object::Instance(instance) => format!(
                "<{}.{} object>",
                instance.class.module(),
                instance.class.qualname()
            ),
            Object::Factory(factory) => format!("<Factory for {}>", factory.callable.repr()),
            Object::Value(value) => value.repr.clone(),
        }
    }

    /// Interfaces directly provided by this object.
    pub fn provided_interfaces(&self) -> Vec<Arc<Interface>> {
        match self {
            Object::Module(module) => module.provides().to_vec(),
            Object::Class(class) => class.class_provides().to_vec(),
            Object::Interface(iface) => iface.types().to_vec(),
            Object::Instance(instance) => {
                let mut provided = instance.provides.clone();
                provided.extend(instance.class.interfaces());
                provided
            }
            Object::Factory(_) | Object::Function(_) | Object::Value(_) => Vec::new(),
        }
    }

    /// Attribute access.
    pub fn attribute(&self, name: &str) -> Option<Object> {
        match self {
            Object::Module(module) => module.member(name).cloned(),
            Object::Class(class) => class.attribute(name),
            Object::Instance(instance) => instance.class.attribute(name),
            Object::Factory(factory) if name == "factory" => Some(factory.callable.clone()),
            _ => None,
        }
    }

    /// Names reachable by attribute access.
    pub fn attribute_names(&self) -> Vec<String> {
        match self {
            Object::Module(module) => module.names(),
            Object::Class(class) => class.attribute_names(),
            Object::Instance(instance) => instance.class.attribute_names(),
            Object::Interface(iface) => iface.names(true),
            Object::Factory(_) => vec!["factory".to_string()],
            Object::Function(function) => function.attributes.keys().cloned().collect(),
            Object::Value(_) => Vec::new(),
        }
    }

    pub fn as_class(&self) -> Option<&Arc<Class>> {
        match self {
            Object::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&Arc<Interface>> {
        match self {
            Object::Interface(iface) => Some(iface),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&Arc<Module>> {
        match self {
            Object::Module(module) => Some(module),
            _ => None,
        }
    }
}
