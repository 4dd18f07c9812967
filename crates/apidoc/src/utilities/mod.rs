//! Introspection helpers shared by the documentation modules and views.

pub mod render;

#[cfg(test)]
mod tests;

use crate::introspector::Introspector;
use object_model::{Checker, Class, Function, Interface, Object, Param};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

pub use render::{BasicRenderer, DocFormat, RenderError, TextRenderer, dedent_string, render_text};

/// Dotted path of an object.
///
/// Methods map to the class declaring them and hook wrappers to the
/// function they wrap. Nested scopes are dropped: only the first segment
/// of a qualified name is kept.
pub fn get_path(object: &Object) -> Option<String> {
    match object {
        Object::Module(module) => Some(module.path().to_string()),
        Object::Class(class) => Some(format!("{}.{}", class.module(), top_segment(class.qualname()))),
        Object::Function(function) => {
            let function = function.implementation();
            match &function.owner {
                Some(owner) => Some(owner.clone()),
                None => Some(format!("{}.{}", function.module, top_segment(&function.qualname))),
            }
        }
        Object::Interface(iface) => Some(iface.path()),
        Object::Instance(instance) => match (&instance.module, &instance.name) {
            (Some(module), Some(name)) => Some(format!("{module}.{name}")),
            _ => None,
        },
        Object::Factory(factory) => get_path(&factory.callable),
        Object::Value(_) => None,
    }
}

fn top_segment(qualname: &str) -> &str {
    qualname.split('.').next().unwrap_or(qualname)
}

/// Private names start with an underscore; dunder names are not private.
pub fn is_private(name: &str) -> bool {
    name.starts_with('_') && !(name.len() > 4 && name.starts_with("__") && name.ends_with("__"))
}

/// Whether documentation can link to `path`.
///
/// The path must not be ignored, its module must import, the name must
/// exist on the module and must not be private, and it must not name a
/// singleton instance that replaced the class of the same path.
pub fn is_referencable(intro: &Introspector, path: &str) -> bool {
    if path.is_empty() || intro.settings().is_ignored(path) {
        return false;
    }
    let importer = intro.importer();
    let Some((module_path, name)) = path.rsplit_once('.') else {
        return importer.import_module(path).is_some();
    };
    if is_private(name) {
        return false;
    }
    if importer.import_module(path).is_some() {
        return true;
    }
    let Some(module) = importer.import_module(module_path) else {
        return false;
    };
    match module.member(name) {
        None => false,
        Some(Object::Instance(instance)) => {
            format!("{}.{}", instance.class.module(), instance.class.qualname()) != path
        }
        Some(_) => true,
    }
}

/// Parameter list of a function, e.g. `(a, b=1, *args, **kw)`.
///
/// The receiver is left out when the function is bound or when
/// `ignore_self` is set.
pub fn get_function_signature(function: &Function, ignore_self: bool) -> String {
    format_signature(&function.params, function.bound || ignore_self)
}

pub fn format_signature(params: &[Param], skip_receiver: bool) -> String {
    let params = match params.first() {
        Some(Param::Positional { .. }) if skip_receiver => &params[1..],
        _ => params,
    };

    let mut parts = Vec::new();
    let mut varargs = None;
    let mut keyword_only = Vec::new();
    let mut kwargs = None;
    for param in params {
        match param {
            Param::Positional { .. } | Param::Unpack(_) => parts.push(format_param(param)),
            Param::VarArgs(name) => varargs = Some(name),
            Param::KeywordOnly { .. } => keyword_only.push(format_param(param)),
            Param::KwArgs(name) => kwargs = Some(name),
        }
    }
    match varargs {
        Some(name) => parts.push(format!("*{name}")),
        None if !keyword_only.is_empty() => parts.push("*".to_string()),
        None => {}
    }
    parts.extend(keyword_only);
    if let Some(name) = kwargs {
        parts.push(format!("**{name}"));
    }
    format!("({})", parts.join(", "))
}

fn format_param(param: &Param) -> String {
    match param {
        Param::Positional { name, default } | Param::KeywordOnly { name, default } => match default {
            Some(default) => format!("{name}={default}"),
            None => name.clone(),
        },
        Param::Unpack(inner) if inner.len() == 1 => format!("({},)", format_param(&inner[0])),
        Param::Unpack(inner) => {
            let inner: Vec<String> = inner.iter().map(format_param).collect();
            format!("({})", inner.join(", "))
        }
        Param::VarArgs(name) => format!("*{name}"),
        Param::KwArgs(name) => format!("**{name}"),
    }
}

/// Public names reachable by attribute access on `object`.
pub fn get_public_attributes(object: &Object) -> Vec<String> {
    object
        .attribute_names()
        .into_iter()
        .filter(|name| !name.starts_with('_'))
        .filter(|name| object.attribute(name).is_some())
        .collect()
}

/// Interfaces searched by [`get_interface_for_attribute`].
pub enum InterfaceSource<'a> {
    Interfaces(&'a [Arc<Interface>]),
    /// The interfaces implemented by a class, together with their direct
    /// bases.
    Class(&'a Class),
}

impl InterfaceSource<'_> {
    fn interfaces(&self) -> Vec<Arc<Interface>> {
        match self {
            InterfaceSource::Interfaces(interfaces) => interfaces.to_vec(),
            InterfaceSource::Class(class) => {
                let mut seen = HashSet::new();
                let mut result = Vec::new();
                for iface in class.interfaces() {
                    let bases = iface.bases().to_vec();
                    for candidate in std::iter::once(iface).chain(bases) {
                        if seen.insert(candidate.path()) {
                            result.push(candidate);
                        }
                    }
                }
                result
            }
        }
    }
}

/// The first interface that declares `name` itself.
pub fn get_interface_for_attribute(name: &str, source: InterfaceSource<'_>) -> Option<Arc<Interface>> {
    source
        .interfaces()
        .into_iter()
        .find(|iface| iface.direct(name).is_some())
}

pub fn get_interface_path_for_attribute(name: &str, source: InterfaceSource<'_>) -> Option<String> {
    get_interface_for_attribute(name, source).map(|iface| iface.path())
}

/// Read and write permission of an attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionIds {
    pub read_perm: Option<String>,
    pub write_perm: Option<String>,
}

/// Permissions a checker declares for `name`; `n/a` when it declares none.
pub fn get_permission_ids(name: &str, checker: Option<&Checker>) -> PermissionIds {
    let Some(checker) = checker else {
        return PermissionIds::default();
    };
    let id = |permission: Option<&object_model::Permission>| {
        permission
            .map(|p| p.id().to_string())
            .unwrap_or_else(|| "n/a".to_string())
    };
    PermissionIds {
        read_perm: Some(id(checker.read_permission(name))),
        write_perm: Some(id(checker.write_permission(name))),
    }
}

/// Split `entries` into `columns` columns of near-equal height.
///
/// Leading columns are the long ones and entries keep their order.
pub fn columnize<T>(entries: Vec<T>, columns: usize) -> Vec<Vec<T>> {
    let columns = columns.max(1);
    let total = entries.len();
    let (per_column, last_full_column) = if total % columns == 0 {
        (total / columns, columns)
    } else {
        (total / columns + 1, total % columns)
    };

    let mut result: Vec<Vec<T>> = Vec::new();
    let mut column = Vec::new();
    for entry in entries {
        let height = if result.len() + 1 > last_full_column {
            per_column - 1
        } else {
            per_column
        };
        if column.len() >= height {
            result.push(std::mem::take(&mut column));
        }
        column.push(entry);
    }
    if !column.is_empty() {
        result.push(column);
    }
    result
}
