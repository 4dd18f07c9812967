use crate::checker::Checker;
use crate::function::Function;
use crate::interface::Interface;
use crate::object::Object;
use crate::ro::linearize;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
pub struct Class {
    module: String,
    qualname: String,
    doc: String,
    bases: Vec<Arc<Class>>,
    implements: Vec<Arc<Interface>>,
    provides: Vec<Arc<Interface>>,
    attributes: Vec<(String, Object)>,
    checker: Option<Arc<Checker>>,
    ancestors: OnceLock<Vec<Arc<Class>>>,
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module && self.qualname == other.qualname
    }
}

impl Eq for Class {}

impl Class {
    pub fn builder(module: impl Into<String>, qualname: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            module: module.into(),
            qualname: qualname.into(),
            doc: String::new(),
            bases: Vec::new(),
            implements: Vec::new(),
            provides: Vec::new(),
            attributes: Vec::new(),
            checker: None,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn qualname(&self) -> &str {
        &self.qualname
    }

    pub fn name(&self) -> &str {
        self.qualname.rsplit('.').next().unwrap_or(&self.qualname)
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn bases(&self) -> &[Arc<Class>] {
        &self.bases
    }

    /// Interfaces declared directly on this class.
    pub fn direct_interfaces(&self) -> &[Arc<Interface>] {
        &self.implements
    }

    /// Interfaces provided by the class object itself.
    pub fn class_provides(&self) -> &[Arc<Interface>] {
        &self.provides
    }

    pub fn checker(&self) -> Option<&Arc<Checker>> {
        self.checker.as_ref()
    }

    /// Base classes in method resolution order, this class excluded.
    pub fn ancestors(&self) -> &[Arc<Class>] {
        self.ancestors.get_or_init(|| {
            linearize(
                &self.bases,
                |base| {
                    let mut ro = vec![base.clone()];
                    ro.extend(base.ancestors().iter().cloned());
                    ro
                },
                |class: &Class| format!("{}.{}", class.module, class.qualname),
            )
        })
    }

    pub fn mro(self: &Arc<Self>) -> Vec<Arc<Class>> {
        let mut ro = vec![self.clone()];
        ro.extend(self.ancestors().iter().cloned());
        ro
    }

    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.ancestors().iter().any(|base| base.as_ref() == other)
    }

    /// Interfaces implemented by instances, inherited declarations included.
    pub fn interfaces(&self) -> Vec<Arc<Interface>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let classes = std::iter::once(self).chain(self.ancestors().iter().map(|c| c.as_ref()));
        for class in classes {
            for iface in &class.implements {
                if seen.insert(iface.path()) {
                    result.push(iface.clone());
                }
            }
        }
        result
    }

    /// Every interface implemented, together with all of their ancestors.
    pub fn flattened_interfaces(&self) -> Vec<Arc<Interface>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for iface in self.interfaces() {
            for entry in iface.iro() {
                if seen.insert(entry.path()) {
                    result.push(entry);
                }
            }
        }
        result
    }

    /// Attributes stored on this class, in declaration order.
    pub fn own_attributes(&self) -> &[(String, Object)] {
        &self.attributes
    }

    /// Attribute lookup along the method resolution order.
    pub fn attribute(&self, name: &str) -> Option<Object> {
        std::iter::once(self)
            .chain(self.ancestors().iter().map(|c| c.as_ref()))
            .find_map(|class| {
                class
                    .attributes
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value.clone())
            })
    }

    /// Names reachable by attribute access, sorted.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for class in std::iter::once(self).chain(self.ancestors().iter().map(|c| c.as_ref())) {
            for (name, _) in &class.attributes {
                names.insert(name.clone());
            }
        }
        names.into_iter().collect()
    }

    /// The `__init__` method, when one is defined along the MRO.
    pub fn constructor(&self) -> Option<Arc<Function>> {
        match self.attribute("__init__") {
            Some(Object::Function(function)) => Some(function),
            _ => None,
        }
    }
}

pub struct ClassBuilder {
    module: String,
    qualname: String,
    doc: String,
    bases: Vec<Arc<Class>>,
    implements: Vec<Arc<Interface>>,
    provides: Vec<Arc<Interface>>,
    attributes: Vec<(String, Object)>,
    checker: Option<Arc<Checker>>,
}

impl ClassBuilder {
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn base(mut self, base: Arc<Class>) -> Self {
        self.bases.push(base);
        self
    }

    pub fn implements(mut self, iface: Arc<Interface>) -> Self {
        self.implements.push(iface);
        self
    }

    pub fn class_provides(mut self, iface: Arc<Interface>) -> Self {
        self.provides.push(iface);
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: Object) -> Self {
        self.attributes.push((name.into(), value));
        self
    }

    /// Add a method; its owner is set to this class.
    pub fn method(mut self, function: Function) -> Self {
        let owner = format!("{}.{}", self.module, self.qualname);
        let name = function.name().to_string();
        self.attributes
            .push((name, Object::Function(Arc::new(function.with_owner(owner)))));
        self
    }

    pub fn checker(mut self, checker: Checker) -> Self {
        self.checker = Some(Arc::new(checker));
        self
    }

    pub fn build(self) -> Arc<Class> {
        Arc::new(Class {
            module: self.module,
            qualname: self.qualname,
            doc: self.doc,
            bases: self.bases,
            implements: self.implements,
            provides: self.provides,
            attributes: self.attributes,
            checker: self.checker,
            ancestors: OnceLock::new(),
        })
    }
}
