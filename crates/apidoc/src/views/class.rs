use super::{Link, render_doc};
use crate::codemodule::{ClassMember, ClassNode};
use crate::introspector::Introspector;
use crate::utilities::{PermissionIds, get_function_signature, get_path, get_permission_ids};
use object_model::{Checker, Object};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ClassAttribute {
    pub name: String,
    pub value: String,
    pub type_name: String,
    pub type_link: Option<Link>,
    pub interface: Option<Link>,
    #[serde(flatten)]
    pub permissions: PermissionIds,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassMethod {
    pub name: String,
    pub signature: String,
    pub doc: String,
    pub interface: Option<Link>,
    #[serde(flatten)]
    pub permissions: PermissionIds,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDetails {
    pub path: String,
    pub doc: String,
    pub bases: Vec<Link>,
    pub known_subclasses: Vec<Link>,
    pub interfaces: Vec<Link>,
    pub constructor: Option<String>,
    pub attributes: Vec<ClassAttribute>,
    pub methods: Vec<ClassMethod>,
    pub method_descriptors: Vec<ClassMethod>,
}

impl ClassDetails {
    pub fn new(intro: &Introspector, node: &ClassNode) -> Self {
        let class = node.class();
        let checker = node.security_checker();
        let checker = checker.as_deref();
        let methods = |members: Vec<ClassMember>| {
            members
                .into_iter()
                .map(|member| class_method(intro, member, checker))
                .collect::<Vec<_>>()
        };

        Self {
            path: node.path().to_string(),
            doc: render_doc(intro, node.doc(), class.module()),
            bases: node
                .bases()
                .iter()
                .filter_map(|base| get_path(&Object::Class(base.clone())))
                .map(|path| Link::code(intro, path))
                .collect(),
            known_subclasses: node
                .known_subclasses()
                .into_iter()
                .map(|(path, _)| Link::code(intro, path))
                .collect(),
            interfaces: node
                .interfaces()
                .iter()
                .map(|iface| Link::interface(intro, iface))
                .collect(),
            constructor: node
                .constructor()
                .map(|function| get_function_signature(&function, true)),
            attributes: node
                .attributes()
                .into_iter()
                .map(|member| class_attribute(intro, member, checker))
                .collect(),
            methods: methods(node.methods()),
            method_descriptors: methods(node.method_descriptors()),
        }
    }
}

fn class_attribute(intro: &Introspector, member: ClassMember, checker: Option<&Checker>) -> ClassAttribute {
    let type_link = member
        .object
        .type_path()
        .map(|path| Link::code(intro, path));
    ClassAttribute {
        permissions: get_permission_ids(&member.name, checker),
        value: member.object.repr(),
        type_name: member.object.type_name(),
        type_link,
        interface: member.interface.as_deref().map(|iface| Link::interface(intro, iface)),
        name: member.name,
    }
}

fn class_method(intro: &Introspector, member: ClassMember, checker: Option<&Checker>) -> ClassMethod {
    let (signature, doc) = match &member.object {
        Object::Function(function) => (
            get_function_signature(function, true),
            render_doc(intro, &function.doc, &function.module),
        ),
        other => (String::new(), render_doc(intro, &other.doc(), "")),
    };
    ClassMethod {
        permissions: get_permission_ids(&member.name, checker),
        signature,
        doc,
        interface: member.interface.as_deref().map(|iface| Link::interface(intro, iface)),
        name: member.name,
    }
}
