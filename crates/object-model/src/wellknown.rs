//! Interfaces and modules every application is assumed to carry.
//!
//! These are the framework's own contracts: the top `Interface`, the
//! `IInterface` meta-interface, the factory interface and the request
//! types used to bucket views. They are always importable through
//! [`builtin_modules`].

use crate::function::Param;
use crate::interface::Interface;
use crate::module::Module;
use crate::object::Object;
use crate::schema::{Field, FieldKind, SimpleField};
use lazy_static::lazy_static;
use std::sync::Arc;

pub const INTERFACE: &str = "zope.interface.Interface";
pub const IINTERFACE: &str = "zope.interface.interfaces.IInterface";
pub const IFACTORY: &str = "zope.component.interfaces.IFactory";
pub const IREQUEST: &str = "zope.publisher.interfaces.IRequest";
pub const IHTTP_REQUEST: &str = "zope.publisher.interfaces.http.IHTTPRequest";
pub const IBROWSER_REQUEST: &str = "zope.publisher.interfaces.browser.IBrowserRequest";
pub const IXMLRPC_REQUEST: &str = "zope.publisher.interfaces.xmlrpc.IXMLRPCRequest";
pub const IFTP_REQUEST: &str = "zope.publisher.interfaces.ftp.IFTPRequest";

/// Namespace URI prefix of the standard configuration namespaces.
pub const ZOPE_NS: &str = "http://namespaces.zope.org/";
pub const META_NS: &str = "http://namespaces.zope.org/meta";

lazy_static! {
    static ref TOP: Arc<Interface> = Interface::builder("zope.interface", "Interface")
        .doc("The top of the interface hierarchy.")
        .build();
    static ref IINTERFACE_SPEC: Arc<Interface> =
        Interface::builder("zope.interface.interfaces", "IInterface")
            .doc("Interface objects.")
            .method("providedBy", vec![Param::positional("object")], "Test whether the interface is provided by the object.")
            .method("implementedBy", vec![Param::positional("class_")], "Test whether the interface is implemented by instances of the class.")
            .method("isOrExtends", vec![Param::positional("other")], "Test whether the interface is or extends another interface.")
            .method("extends", vec![Param::positional("other"), Param::with_default("strict", "True")], "Test whether the interface extends another interface.")
            .method("names", vec![Param::with_default("all", "False")], "Return the attribute names defined by the interface.")
            .build();
    static ref IFACTORY_SPEC: Arc<Interface> =
        Interface::builder("zope.component.interfaces", "IFactory")
            .doc("A factory is responsible for creating other components.")
            .attribute("title", "The factory title.")
            .attribute("description", "A brief description of the factory.")
            .method("__call__", vec![Param::VarArgs("args".into()), Param::KwArgs("kw".into())], "Return an instance of the objects we're a factory for.")
            .method("getInterfaces", vec![], "Get the interfaces implemented by the factory.")
            .build();
    static ref IREQUEST_SPEC: Arc<Interface> =
        Interface::builder("zope.publisher.interfaces", "IRequest")
            .doc("Basic request data.")
            .build();
    static ref IHTTP_REQUEST_SPEC: Arc<Interface> =
        Interface::builder("zope.publisher.interfaces.http", "IHTTPRequest")
            .doc("HTTP request data.")
            .base(IREQUEST_SPEC.clone())
            .build();
    static ref IBROWSER_REQUEST_SPEC: Arc<Interface> =
        Interface::builder("zope.publisher.interfaces.browser", "IBrowserRequest")
            .doc("Browser-specific request.")
            .base(IHTTP_REQUEST_SPEC.clone())
            .build();
    static ref IXMLRPC_REQUEST_SPEC: Arc<Interface> =
        Interface::builder("zope.publisher.interfaces.xmlrpc", "IXMLRPCRequest")
            .doc("XML-RPC request.")
            .base(IHTTP_REQUEST_SPEC.clone())
            .build();
    static ref IFTP_REQUEST_SPEC: Arc<Interface> =
        Interface::builder("zope.publisher.interfaces.ftp", "IFTPRequest")
            .doc("FTP request.")
            .base(IREQUEST_SPEC.clone())
            .build();
    static ref BUILTIN_MODULES: Vec<Arc<Module>> = build_builtin_modules();
}

pub fn top_interface() -> Arc<Interface> {
    TOP.clone()
}

pub fn iinterface() -> Arc<Interface> {
    IINTERFACE_SPEC.clone()
}

pub fn ifactory() -> Arc<Interface> {
    IFACTORY_SPEC.clone()
}

pub fn irequest() -> Arc<Interface> {
    IREQUEST_SPEC.clone()
}

/// The request types views are bucketed by, as `(label, interface)` pairs.
pub fn request_types() -> Vec<(&'static str, Arc<Interface>)> {
    vec![
        ("browser", IBROWSER_REQUEST_SPEC.clone()),
        ("xmlrpc", IXMLRPC_REQUEST_SPEC.clone()),
        ("http", IHTTP_REQUEST_SPEC.clone()),
        ("ftp", IFTP_REQUEST_SPEC.clone()),
        ("other", IREQUEST_SPEC.clone()),
    ]
}

/// Modules that are always importable.
pub fn builtin_modules() -> &'static [Arc<Module>] {
    &BUILTIN_MODULES
}

fn interface_module(path: &str, ifaces: &[&Arc<Interface>]) -> Arc<Module> {
    ifaces
        .iter()
        .fold(Module::builder(path), |builder, iface| {
            builder.member(iface.name(), Object::Interface((*iface).clone()))
        })
        .build()
}

fn ifield() -> Arc<Interface> {
    Interface::builder("zope.schema.interfaces", "IField")
        .doc("Basic schema field interface.")
        .field(Field::new("title", FieldKind::Simple(SimpleField::TextLine)).with_required(false))
        .field(Field::new("description", FieldKind::Simple(SimpleField::Text)).with_required(false))
        .field(Field::new("required", FieldKind::Simple(SimpleField::Bool)).with_default("True"))
        .build()
}

fn field_interfaces(module: &str, base: &Arc<Interface>, names: &[String]) -> Vec<Arc<Interface>> {
    names
        .iter()
        .map(|name| {
            Interface::builder(module, format!("I{name}"))
                .doc(format!("Field interface for `{name}` values."))
                .base(base.clone())
                .build()
        })
        .collect()
}

fn build_builtin_modules() -> Vec<Arc<Module>> {
    let ifield = ifield();
    let simple = |kinds: &[SimpleField]| -> Vec<String> {
        kinds.iter().map(ToString::to_string).collect()
    };

    let mut schema_ifaces = vec![ifield.clone()];
    schema_ifaces.extend(field_interfaces(
        "zope.schema.interfaces",
        &ifield,
        &simple(&[
            SimpleField::Text,
            SimpleField::TextLine,
            SimpleField::Bytes,
            SimpleField::BytesLine,
            SimpleField::Bool,
            SimpleField::Int,
            SimpleField::Float,
            SimpleField::Choice,
            SimpleField::List,
            SimpleField::Tuple,
            SimpleField::Set,
            SimpleField::Dict,
            SimpleField::Datetime,
            SimpleField::Object,
            SimpleField::URI,
            SimpleField::Id,
        ]),
    ));
    let mut configuration_names = simple(&[
        SimpleField::Path,
        SimpleField::MessageID,
        SimpleField::PythonIdentifier,
        SimpleField::Permission,
    ]);
    configuration_names.extend(["GlobalObject", "GlobalInterface", "Tokens"].map(String::from));
    let configuration_ifaces =
        field_interfaces("zope.configuration.interfaces", &ifield, &configuration_names);

    vec![
        interface_module("zope.interface", &[&*TOP]),
        interface_module("zope.interface.interfaces", &[&*IINTERFACE_SPEC]),
        interface_module("zope.component.interfaces", &[&*IFACTORY_SPEC]),
        interface_module("zope.publisher.interfaces", &[&*IREQUEST_SPEC]),
        interface_module("zope.publisher.interfaces.http", &[&*IHTTP_REQUEST_SPEC]),
        interface_module("zope.publisher.interfaces.browser", &[&*IBROWSER_REQUEST_SPEC]),
        interface_module("zope.publisher.interfaces.xmlrpc", &[&*IXMLRPC_REQUEST_SPEC]),
        interface_module("zope.publisher.interfaces.ftp", &[&*IFTP_REQUEST_SPEC]),
        interface_module("zope.schema.interfaces", &schema_ifaces.iter().collect::<Vec<_>>()),
        interface_module(
            "zope.configuration.interfaces",
            &configuration_ifaces.iter().collect::<Vec<_>>(),
        ),
    ]
}
