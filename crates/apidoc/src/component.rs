//! Queries over the component registry, and the plain records the views
//! and the exporter render registrations from.

use crate::introspector::Introspector;
use crate::utilities::{get_path, is_referencable, render_text, DocFormat};
use object_model::{Interface, Object, ParserInfo, Registration, RegistrationInfo, wellknown};
use serde::Serialize;

/// Key under which utilities registered without a name are shown.
pub const NONAME: &str = "__noname__";

/// How closely a required interface matches the one being documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Level(u8);

impl Level {
    /// The required interface is the documented one.
    pub const SPECIFIC: Level = Level(1);
    /// The required interface strictly extends the documented one.
    pub const EXTENDED: Level = Level(2);
    /// The required interface is the top interface, or any object.
    pub const GENERIC: Level = Level(4);
    pub const ALL: Level = Level(7);

    pub fn contains(self, other: Level) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Level) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for Level {
    type Output = Level;

    fn bitor(self, rhs: Level) -> Level {
        Level(self.0 | rhs.0)
    }
}

/// Level of one entry of a registration's required tuple.
pub fn required_level(required: Option<&Interface>, iface: &Interface) -> Option<Level> {
    match required {
        None => Some(Level::GENERIC),
        Some(required) if required.is_top() => Some(Level::GENERIC),
        Some(required) if required == iface => Some(Level::SPECIFIC),
        Some(required) if required.extends(iface) => Some(Level::EXTENDED),
        Some(_) => None,
    }
}

/// Keep the registrations with a required interface at one of `level`.
pub fn filter_by_level<'a>(
    registrations: impl IntoIterator<Item = &'a Registration>,
    iface: &Interface,
    level: Level,
) -> Vec<&'a Registration> {
    registrations
        .into_iter()
        .filter(|registration| {
            registration.required.iter().any(|required| {
                required_level(required.as_deref(), iface).is_some_and(|found| level.intersects(found))
            })
        })
        .collect()
}

fn is_view(registration: &Registration) -> bool {
    let request = wellknown::irequest();
    registration
        .required
        .last()
        .and_then(Option::as_ref)
        .is_some_and(|last| last.is_or_extends(&request))
}

fn adapter_like(intro: &Introspector) -> impl Iterator<Item = &Registration> {
    let registry = intro.registry();
    registry
        .adapters()
        .chain(registry.subscribers())
        .chain(registry.handlers())
}

/// Adapters, subscribers and handlers registered for `iface`, for an
/// interface extending it, or for any object.
///
/// Views are left out unless `with_views` is set.
pub fn required_adapters<'a>(intro: &'a Introspector, iface: &Interface, with_views: bool) -> Vec<&'a Registration> {
    adapter_like(intro)
        .filter(|registration| !registration.required.is_empty())
        .filter(|registration| with_views || !is_view(registration))
        .filter(|registration| {
            registration
                .required
                .iter()
                .any(|required| required_level(required.as_deref(), iface).is_some())
        })
        .collect()
}

/// Adapters and subscribers whose provided interface is or extends `iface`.
pub fn provided_adapters<'a>(intro: &'a Introspector, iface: &Interface, with_views: bool) -> Vec<&'a Registration> {
    adapter_like(intro)
        .filter(|registration| with_views || !is_view(registration))
        .filter(|registration| {
            registration
                .provided
                .as_ref()
                .is_some_and(|provided| provided.is_or_extends(iface))
        })
        .collect()
}

/// Views for `request_type` whose context is related to `iface`.
///
/// A context is related when it is, extends or is extended by `iface`, or
/// when the view is registered for any object.
pub fn views<'a>(intro: &'a Introspector, iface: &Interface, request_type: &Interface) -> Vec<&'a Registration> {
    intro
        .registry()
        .adapters()
        .filter(|registration| {
            let Some((Some(last), contexts)) = registration.required.split_last() else {
                return false;
            };
            last.is_or_extends(request_type)
                && contexts.iter().any(|context| match context {
                    None => true,
                    Some(context) => {
                        context.is_top() || context.is_or_extends(iface) || iface.is_or_extends(context)
                    }
                })
        })
        .collect()
}

/// Utilities providing `iface` or an interface extending it.
pub fn utilities_for<'a>(intro: &'a Introspector, iface: &'a Interface) -> Vec<&'a Registration> {
    intro.registry().utilities_for(iface).collect()
}

/// Factories announcing they produce `iface` or an extension of it.
pub fn factories_for<'a>(intro: &'a Introspector, iface: &Interface) -> Vec<&'a Registration> {
    let ifactory = wellknown::ifactory();
    intro
        .registry()
        .utilities_for(&ifactory)
        .filter(|registration| match &registration.factory {
            Object::Factory(factory) => factory
                .interfaces
                .iter()
                .any(|produced| produced.is_or_extends(iface)),
            _ => false,
        })
        .collect()
}

/// The object a factory ultimately creates instances from.
///
/// Factories are unwrapped to their callable, hook wrappers to the
/// function they wrap and instances to their class.
pub fn get_real_factory(factory: &Object) -> Object {
    match factory {
        Object::Factory(factory) => get_real_factory(&factory.callable),
        Object::Function(function) if function.wrapped.is_some() => Object::Function(function.implementation()),
        Object::Instance(instance) => Object::Class(instance.class.clone()),
        other => other.clone(),
    }
}

/// URL of the code browser page of `path`, when it can be linked to.
pub fn code_url(intro: &Introspector, path: &str) -> Option<String> {
    is_referencable(intro, path).then(|| {
        format!(
            "{}/Code/{}",
            intro.settings().base_url.trim_end_matches('/'),
            path.replace('.', "/")
        )
    })
}

pub fn interface_url(intro: &Introspector, path: &str) -> String {
    format!("{}/Interface/{path}", intro.settings().base_url.trim_end_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceInfo {
    pub module: String,
    pub name: String,
}

impl InterfaceInfo {
    pub fn new(iface: &Interface) -> Self {
        Self {
            module: iface.module().to_string(),
            name: iface.name().to_string(),
        }
    }

    pub fn path(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserInfoDetails {
    pub file: String,
    /// The file relative to the search paths, `/`-separated.
    pub url: Option<String>,
    pub line: usize,
    pub column: usize,
    pub eline: usize,
    pub ecolumn: usize,
}

impl ParserInfoDetails {
    pub fn new(intro: &Introspector, info: &ParserInfo) -> Self {
        Self {
            file: info.file.display().to_string(),
            url: intro.settings().relative_source_path(&info.file),
            line: info.line,
            column: info.column,
            eline: info.eline,
            ecolumn: info.ecolumn,
        }
    }
}

/// Documentation text or source position of a registration.
pub(crate) fn registration_source(intro: &Introspector, info: &RegistrationInfo) -> (Option<String>, Option<ParserInfoDetails>) {
    match info {
        RegistrationInfo::None => (None, None),
        RegistrationInfo::Text(text) => (Some(text.clone()), None),
        RegistrationInfo::Parser(info) => (None, Some(ParserInfoDetails::new(intro, info))),
    }
}

/// An adapter, subscriber or handler registration.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterDetails {
    pub provided: Option<InterfaceInfo>,
    pub required: Vec<InterfaceInfo>,
    pub name: String,
    pub factory: Option<String>,
    pub factory_url: Option<String>,
    pub doc: Option<String>,
    pub zcml: Option<ParserInfoDetails>,
}

impl AdapterDetails {
    pub fn new(intro: &Introspector, registration: &Registration) -> Self {
        let factory = get_path(&get_real_factory(&registration.factory));
        let factory_url = factory.as_deref().and_then(|path| code_url(intro, path));
        let (doc, zcml) = registration_source(intro, &registration.info);
        Self {
            provided: registration.provided.as_deref().map(InterfaceInfo::new),
            required: registration
                .required
                .iter()
                .flatten()
                .map(|iface| InterfaceInfo::new(iface))
                .collect(),
            name: registration.name.clone(),
            factory,
            factory_url,
            doc,
            zcml,
        }
    }
}

/// A utility registration.
#[derive(Debug, Clone, Serialize)]
pub struct UtilityDetails {
    pub name: String,
    /// Key of the utility below its interface in the utility module.
    pub url_name: String,
    pub iface_id: Option<String>,
    pub path: Option<String>,
    pub url: Option<String>,
    pub doc: Option<String>,
    pub zcml: Option<ParserInfoDetails>,
}

impl UtilityDetails {
    pub fn new(intro: &Introspector, registration: &Registration) -> Self {
        let component = match &registration.factory {
            Object::Instance(instance) => Object::Class(instance.class.clone()),
            other => other.clone(),
        };
        let path = get_path(&component);
        let url = match (&component, &path) {
            (Object::Interface(_), Some(path)) => Some(interface_url(intro, path)),
            (_, Some(path)) => code_url(intro, path),
            (_, None) => None,
        };
        let (doc, zcml) = registration_source(intro, &registration.info);
        let name = if registration.name.is_empty() {
            NONAME.to_string()
        } else {
            registration.name.clone()
        };
        Self {
            url_name: name.clone(),
            name,
            iface_id: registration.provided.as_ref().map(|iface| iface.path()),
            path,
            url,
            doc,
            zcml,
        }
    }
}

/// A factory registration.
#[derive(Debug, Clone, Serialize)]
pub struct FactoryDetails {
    pub name: String,
    pub title: String,
    pub description: String,
    pub url: Option<String>,
}

impl FactoryDetails {
    pub fn new(intro: &Introspector, registration: &Registration) -> Self {
        let (title, description, callable) = match &registration.factory {
            Object::Factory(factory) => (
                factory.title.clone(),
                factory.description.clone(),
                factory.callable.clone(),
            ),
            other => (String::new(), String::new(), get_real_factory(other)),
        };
        let url = get_path(&callable).and_then(|path| code_url(intro, &path));
        let name = if registration.name.is_empty() {
            NONAME.to_string()
        } else {
            registration.name.clone()
        };
        Self {
            name,
            title,
            description: render_text(intro.renderer(), &description, DocFormat::default()),
            url,
        }
    }
}

/// Registrations of one interface split by required level.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LevelBuckets {
    pub specific: Vec<AdapterDetails>,
    pub extended: Vec<AdapterDetails>,
    pub generic: Vec<AdapterDetails>,
}

impl LevelBuckets {
    pub fn new(intro: &Introspector, registrations: &[&Registration], iface: &Interface) -> Self {
        let bucket = |level| {
            filter_by_level(registrations.iter().copied(), iface, level)
                .into_iter()
                .map(|registration| AdapterDetails::new(intro, registration))
                .collect()
        };
        Self {
            specific: bucket(Level::SPECIFIC),
            extended: bucket(Level::EXTENDED),
            generic: bucket(Level::GENERIC),
        }
    }
}

#[cfg(test)]
mod tests;
