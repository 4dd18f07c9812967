use super::{Link, render_doc};
use crate::component::{
    AdapterDetails, FactoryDetails, InterfaceInfo, LevelBuckets, UtilityDetails, factories_for, provided_adapters,
    required_adapters, views,
};
use crate::introspector::Introspector;
use crate::utilities::format_signature;
use object_model::{Field, Interface, InterfaceMember, wellknown};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceAttribute {
    pub name: String,
    pub doc: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub signature: String,
    pub doc: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDetails {
    pub name: String,
    /// The interface of the field class, e.g. `ITextLine`.
    pub iface: Option<InterfaceInfo>,
    pub class: FieldClass,
    pub required: bool,
    pub required_string: &'static str,
    pub default: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldClass {
    pub name: String,
    pub path: String,
}

impl FieldDetails {
    pub fn new(intro: &Introspector, field: &Field, module: &str) -> Self {
        let iface = field.kind.interface_path().map(|path| {
            let (module, name) = path.rsplit_once('.').unwrap_or(("", path.as_str()));
            InterfaceInfo {
                module: module.to_string(),
                name: name.to_string(),
            }
        });
        Self {
            name: field.name.clone(),
            iface,
            class: FieldClass {
                name: field.kind.class_name(),
                path: field.kind.class_path(),
            },
            required: field.required,
            required_string: if field.required { "required" } else { "optional" },
            default: field.default.clone(),
            description: render_doc(intro, &field.doc(), module),
        }
    }
}

/// Fields of a schema, required ones first, each group in declaration order.
pub(super) fn schema_fields(intro: &Introspector, schema: &Interface) -> Vec<FieldDetails> {
    let mut fields = schema.fields();
    fields.sort_by_key(|field| !field.required);
    fields
        .into_iter()
        .map(|field| FieldDetails::new(intro, field, schema.module()))
        .collect()
}

/// Views of one request type.
#[derive(Debug, Clone, Serialize)]
pub struct ViewBucket {
    pub request_type: String,
    pub request_iface: InterfaceInfo,
    #[serde(flatten)]
    pub levels: LevelBuckets,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceDetails {
    pub id: String,
    pub name: String,
    pub module: String,
    pub doc: String,
    pub bases: Vec<Link>,
    pub types: Vec<Link>,
    pub attributes: Vec<InterfaceAttribute>,
    pub methods: Vec<InterfaceMethod>,
    pub fields: Vec<FieldDetails>,
    pub required_adapters: LevelBuckets,
    pub provided_adapters: Vec<AdapterDetails>,
    pub classes: Vec<Link>,
    pub factories: Vec<FactoryDetails>,
    pub utilities: Vec<UtilityDetails>,
    pub views: Vec<ViewBucket>,
}

impl InterfaceDetails {
    pub fn new(intro: &Introspector, iface: &Arc<Interface>) -> Self {
        let module = iface.module();

        // Members in resolution order; names shadowed further down are hidden.
        let mut seen = FxHashSet::default();
        let mut attributes = Vec::new();
        let mut methods = Vec::new();
        for source in iface.iro() {
            for member in source.members() {
                if !seen.insert(member.name().to_string()) {
                    continue;
                }
                match member {
                    InterfaceMember::Attribute { name, doc } => attributes.push(InterfaceAttribute {
                        name: name.clone(),
                        doc: render_doc(intro, doc, source.module()),
                    }),
                    InterfaceMember::Method(method) => methods.push(InterfaceMethod {
                        name: method.name.clone(),
                        signature: format_signature(&method.params, false),
                        doc: render_doc(intro, &method.doc, source.module()),
                    }),
                    InterfaceMember::Field(_) => {}
                }
            }
        }
        attributes.sort_by(|a, b| a.name.cmp(&b.name));
        methods.sort_by(|a, b| a.name.cmp(&b.name));

        let required = required_adapters(intro, iface, false);
        let view_buckets = wellknown::request_types()
            .into_iter()
            .filter_map(|(label, request_type)| {
                let found = views(intro, iface, &request_type);
                if found.is_empty() {
                    return None;
                }
                Some(ViewBucket {
                    request_type: label.to_string(),
                    request_iface: InterfaceInfo::new(&request_type),
                    levels: LevelBuckets::new(intro, &found, iface),
                })
            })
            .collect();

        Self {
            id: iface.path(),
            name: iface.name().to_string(),
            module: module.to_string(),
            doc: render_doc(intro, iface.doc(), module),
            bases: iface.bases().iter().map(|base| Link::interface(intro, base)).collect(),
            types: iface.types().iter().map(|meta| Link::interface(intro, meta)).collect(),
            attributes,
            methods,
            fields: schema_fields(intro, iface),
            required_adapters: LevelBuckets::new(intro, &required, iface),
            provided_adapters: provided_adapters(intro, iface, false)
                .into_iter()
                .map(|registration| AdapterDetails::new(intro, registration))
                .collect(),
            classes: intro
                .classes()
                .classes_implementing(iface)
                .into_iter()
                .map(|(path, _)| Link::code(intro, path))
                .collect(),
            factories: factories_for(intro, iface)
                .into_iter()
                .map(|registration| FactoryDetails::new(intro, registration))
                .collect(),
            utilities: intro
                .registry()
                .utilities_for(iface)
                .map(|registration| UtilityDetails::new(intro, registration))
                .collect(),
            views: view_buckets,
        }
    }
}
