//! Interfaces: named capability contracts.
//!
//! An interface declares attributes, methods and schema fields, extends zero
//! or more base interfaces and may itself provide meta-interfaces (its
//! "types"). Equality is by dotted path.

use crate::class::Class;
use crate::function::Param;
use crate::ro::linearize;
use crate::schema::Field;
use crate::wellknown;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub params: Vec<Param>,
    pub doc: String,
}

#[derive(Debug, Clone)]
pub enum InterfaceMember {
    Attribute { name: String, doc: String },
    Method(Method),
    Field(Field),
}

impl InterfaceMember {
    pub fn name(&self) -> &str {
        match self {
            InterfaceMember::Attribute { name, .. } => name,
            InterfaceMember::Method(method) => &method.name,
            InterfaceMember::Field(field) => &field.name,
        }
    }

    pub fn doc(&self) -> String {
        match self {
            InterfaceMember::Attribute { doc, .. } => doc.clone(),
            InterfaceMember::Method(method) => method.doc.clone(),
            InterfaceMember::Field(field) => field.doc(),
        }
    }
}

#[derive(Debug)]
pub struct Interface {
    module: String,
    name: String,
    doc: String,
    bases: Vec<Arc<Interface>>,
    types: Vec<Arc<Interface>>,
    members: Vec<InterfaceMember>,
    ancestors: OnceLock<Vec<Arc<Interface>>>,
}

impl PartialEq for Interface {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module && self.name == other.name
    }
}

impl Eq for Interface {}

impl Interface {
    pub fn builder(module: impl Into<String>, name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder {
            module: module.into(),
            name: name.into(),
            doc: String::new(),
            bases: Vec::new(),
            types: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Direct base interfaces.
    pub fn bases(&self) -> &[Arc<Interface>] {
        &self.bases
    }

    /// Interfaces directly provided by this interface object.
    pub fn types(&self) -> &[Arc<Interface>] {
        &self.types
    }

    /// Members declared directly on this interface, in declaration order.
    pub fn members(&self) -> &[InterfaceMember] {
        &self.members
    }

    pub fn is_top(&self) -> bool {
        self.path() == wellknown::INTERFACE
    }

    /// All base interfaces in resolution order, this interface excluded.
    pub fn ancestors(&self) -> &[Arc<Interface>] {
        self.ancestors.get_or_init(|| {
            linearize(
                &self.bases,
                |base| {
                    let mut ro = vec![base.clone()];
                    ro.extend(base.ancestors().iter().cloned());
                    ro
                },
                Interface::path,
            )
        })
    }

    /// Interface resolution order, starting with this interface.
    pub fn iro(self: &Arc<Self>) -> Vec<Arc<Interface>> {
        let mut ro = vec![self.clone()];
        ro.extend(self.ancestors().iter().cloned());
        ro
    }

    /// True when `other` is a strict ancestor of this interface.
    pub fn extends(&self, other: &Interface) -> bool {
        self != other && self.ancestors().iter().any(|base| base.as_ref() == other)
    }

    pub fn is_or_extends(&self, other: &Interface) -> bool {
        self == other || self.extends(other)
    }

    /// Names declared by this interface; with `all`, including inherited ones.
    pub fn names(&self, all: bool) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let own = std::iter::once(self);
        let sources: Vec<&Interface> = if all {
            own.chain(self.ancestors().iter().map(|base| base.as_ref()))
                .collect()
        } else {
            own.collect()
        };
        for source in sources {
            for member in &source.members {
                if seen.insert(member.name().to_string()) {
                    names.push(member.name().to_string());
                }
            }
        }
        names
    }

    /// Look up a member declared directly on this interface.
    pub fn direct(&self, name: &str) -> Option<&InterfaceMember> {
        self.members.iter().find(|member| member.name() == name)
    }

    /// Look up a member on this interface or any ancestor.
    pub fn get(&self, name: &str) -> Option<&InterfaceMember> {
        self.direct(name).or_else(|| {
            self.ancestors()
                .iter()
                .find_map(|base| base.direct(name))
        })
    }

    /// All schema fields, inherited ones included, in declaration order.
    pub fn fields(&self) -> Vec<&Field> {
        let mut seen = HashSet::new();
        let mut fields: Vec<(usize, &Field)> = Vec::new();
        let sources = std::iter::once(self).chain(self.ancestors().iter().map(|b| b.as_ref()));
        for (depth, source) in sources.enumerate() {
            for member in &source.members {
                if let InterfaceMember::Field(field) = member {
                    if seen.insert(field.name.clone()) {
                        fields.push((depth, field));
                    }
                }
            }
        }
        // Inherited fields come before the fields declared further down.
        fields.sort_by(|(da, a), (db, b)| db.cmp(da).then(a.order.cmp(&b.order)));
        fields.into_iter().map(|(_, field)| field).collect()
    }

    /// Whether instances of `class` provide this interface.
    pub fn implemented_by(&self, class: &Arc<Class>) -> bool {
        class
            .interfaces()
            .iter()
            .any(|declared| declared.is_or_extends(self))
    }

    /// Whether this interface object itself provides `meta`.
    pub fn provides(&self, meta: &Interface) -> bool {
        self.types.iter().any(|t| t.is_or_extends(meta)) || meta.path() == wellknown::IINTERFACE
    }
}

pub struct InterfaceBuilder {
    module: String,
    name: String,
    doc: String,
    bases: Vec<Arc<Interface>>,
    types: Vec<Arc<Interface>>,
    members: Vec<InterfaceMember>,
}

impl InterfaceBuilder {
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn base(mut self, base: Arc<Interface>) -> Self {
        self.bases.push(base);
        self
    }

    pub fn bases(mut self, bases: impl IntoIterator<Item = Arc<Interface>>) -> Self {
        self.bases.extend(bases);
        self
    }

    pub fn provides(mut self, meta: Arc<Interface>) -> Self {
        self.types.push(meta);
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, doc: impl Into<String>) -> Self {
        self.members.push(InterfaceMember::Attribute {
            name: name.into(),
            doc: doc.into(),
        });
        self
    }

    pub fn method(mut self, name: impl Into<String>, params: Vec<Param>, doc: impl Into<String>) -> Self {
        self.members.push(InterfaceMember::Method(Method {
            name: name.into(),
            params,
            doc: doc.into(),
        }));
        self
    }

    pub fn field(mut self, mut field: Field) -> Self {
        field.order = self
            .members
            .iter()
            .filter(|member| matches!(member, InterfaceMember::Field(_)))
            .count();
        self.members.push(InterfaceMember::Field(field));
        self
    }

    /// Interfaces without bases extend the top `Interface`, which itself has none.
    pub fn build(mut self) -> Arc<Interface> {
        let path = format!("{}.{}", self.module, self.name);
        if self.bases.is_empty() && path != wellknown::INTERFACE {
            self.bases.push(wellknown::top_interface());
        }
        Arc::new(Interface {
            module: self.module,
            name: self.name,
            doc: self.doc,
            bases: self.bases,
            types: self.types,
            members: self.members,
            ancestors: OnceLock::new(),
        })
    }
}
