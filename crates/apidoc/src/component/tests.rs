use super::*;
use crate::test_support::{introspector_with, sample_tree};
use object_model::{Class, ComponentRegistry, Factory, Function, Instance};
use std::path::PathBuf;
use std::sync::Arc;

fn iface(name: &str) -> Arc<Interface> {
    Interface::builder("tests.interfaces", name).build()
}

fn request_type(label: &str) -> Arc<Interface> {
    wellknown::request_types()
        .into_iter()
        .find(|(name, _)| *name == label)
        .map(|(_, iface)| iface)
        .unwrap()
}

fn class_a() -> Object {
    Object::Class(Class::builder("pkg.sub.foo", "A").build())
}

#[test]
fn test_required_and_provided_adapters() {
    let dir = sample_tree();
    let ifoo = iface("IFoo");
    let ibar = iface("IBar");
    let mut registry = ComponentRegistry::new();
    registry.register_adapter(vec![Some(ibar.clone())], ifoo.clone(), class_a(), "", RegistrationInfo::None);
    let intro = introspector_with(&dir, registry);

    assert_eq!(required_adapters(&intro, &ibar, false).len(), 1);
    assert!(required_adapters(&intro, &ifoo, false).is_empty());
    assert_eq!(provided_adapters(&intro, &ifoo, false).len(), 1);
    assert!(provided_adapters(&intro, &ibar, false).is_empty());
    assert!(views(&intro, &ifoo, &request_type("http")).is_empty());
}

#[test]
fn test_level_partition() {
    let dir = sample_tree();
    let ibase = iface("IBase");
    let iderived = Interface::builder("tests.interfaces", "IDerived").base(ibase.clone()).build();
    let iother = iface("IOther");
    let provided = iface("IProvided");

    let mut registry = ComponentRegistry::new();
    for (name, required) in [
        ("specific", Some(ibase.clone())),
        ("extended", Some(iderived.clone())),
        ("any", None),
        ("top", Some(wellknown::top_interface())),
        ("unrelated", Some(iother.clone())),
    ] {
        registry.register_adapter(vec![required], provided.clone(), class_a(), name, RegistrationInfo::None);
    }
    registry.register_handler(vec![Some(ibase.clone())], class_a(), RegistrationInfo::None);
    let intro = introspector_with(&dir, registry);

    let found = required_adapters(&intro, &ibase, false);
    let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["specific", "extended", "any", "top", ""]);

    let filtered = |level| -> Vec<&str> {
        filter_by_level(found.iter().copied(), &ibase, level)
            .into_iter()
            .map(|r| r.name.as_str())
            .collect()
    };
    assert_eq!(filtered(Level::SPECIFIC), vec!["specific", ""]);
    assert_eq!(filtered(Level::EXTENDED), vec!["extended"]);
    assert_eq!(filtered(Level::GENERIC), vec!["any", "top"]);
    assert_eq!(filtered(Level::SPECIFIC | Level::GENERIC), vec!["specific", "any", "top", ""]);
    assert_eq!(filtered(Level::ALL).len(), found.len());

    assert!(Level::ALL.contains(Level::EXTENDED));
    assert!(!Level::SPECIFIC.contains(Level::ALL));
}

#[test]
fn test_views_by_request_type() {
    let dir = sample_tree();
    let ibase = iface("IBase");
    let iderived = Interface::builder("tests.interfaces", "IDerived").base(ibase.clone()).build();
    let ibrowser = request_type("browser");

    let mut registry = ComponentRegistry::new();
    registry.register_adapter(
        vec![Some(ibase.clone()), Some(ibrowser.clone())],
        iface("IView"),
        class_a(),
        "index.html",
        RegistrationInfo::None,
    );
    registry.register_adapter(
        vec![None, Some(ibrowser)],
        iface("IView"),
        class_a(),
        "any.html",
        RegistrationInfo::None,
    );
    let intro = introspector_with(&dir, registry);

    let names = |found: Vec<&Registration>| -> Vec<String> { found.iter().map(|r| r.name.clone()).collect() };
    // Browser requests are HTTP requests as well.
    assert_eq!(names(views(&intro, &ibase, &request_type("http"))), vec!["index.html", "any.html"]);
    assert_eq!(names(views(&intro, &iderived, &request_type("browser"))), vec!["index.html", "any.html"]);
    assert!(views(&intro, &ibase, &request_type("ftp")).is_empty());

    assert!(required_adapters(&intro, &ibase, false).is_empty());
    assert_eq!(required_adapters(&intro, &ibase, true).len(), 2);
}

#[test]
fn test_utilities_and_factories() {
    let dir = sample_tree();
    let ibase = iface("IBase");
    let iderived = Interface::builder("tests.interfaces", "IDerived").base(ibase.clone()).build();
    let a = Class::builder("pkg.sub.foo", "A").build();

    let mut registry = ComponentRegistry::new();
    registry.register_utility(
        iderived.clone(),
        Object::Instance(Arc::new(Instance::new(a.clone()))),
        "",
        RegistrationInfo::Text("The default A.".to_string()),
    );
    registry.register_factory(
        Factory::new(Object::Class(a))
            .with_title("An A")
            .producing(iderived.clone()),
        "pkg.A",
        RegistrationInfo::None,
    );
    let intro = introspector_with(&dir, registry);

    let utilities = utilities_for(&intro, &ibase);
    assert_eq!(utilities.len(), 1);
    let details = UtilityDetails::new(&intro, utilities[0]);
    assert_eq!(details.name, NONAME);
    assert_eq!(details.iface_id.as_deref(), Some("tests.interfaces.IDerived"));
    assert_eq!(details.path.as_deref(), Some("pkg.sub.foo.A"));
    assert_eq!(details.url.as_deref(), Some("/++apidoc++/Code/pkg/sub/foo/A"));
    assert_eq!(details.doc.as_deref(), Some("The default A."));

    let factories = factories_for(&intro, &ibase);
    assert_eq!(factories.len(), 1);
    let details = FactoryDetails::new(&intro, factories[0]);
    assert_eq!(details.name, "pkg.A");
    assert_eq!(details.title, "An A");
    assert_eq!(details.url.as_deref(), Some("/++apidoc++/Code/pkg/sub/foo/A"));
    assert!(factories_for(&intro, &iface("IOther")).is_empty());
}

#[test]
fn test_real_factory() {
    let a = Class::builder("pkg.sub.foo", "A").build();
    let instance = Object::Instance(Arc::new(Instance::new(a.clone())));
    assert!(matches!(get_real_factory(&instance), Object::Class(c) if Arc::ptr_eq(&c, &a)));

    let factory = Object::Factory(Arc::new(Factory::new(instance)));
    assert!(matches!(get_real_factory(&factory), Object::Class(c) if Arc::ptr_eq(&c, &a)));

    let inner = Arc::new(Function::new("pkg.sub.foo", "helper"));
    let wrapper = Object::Function(Arc::new(Function::new("pkg.hooks", "hook").wrapping(inner.clone())));
    assert!(matches!(get_real_factory(&wrapper), Object::Function(f) if Arc::ptr_eq(&f, &inner)));

    let plain = Object::Class(a);
    assert!(matches!(get_real_factory(&plain), Object::Class(_)));
}

#[test]
fn test_factory_urls_only_for_referencable_paths() {
    let dir = sample_tree();
    let iprovided = iface("IProvided");
    let ibase = iface("IBase");
    let mut registry = ComponentRegistry::new();
    registry.register_adapter(vec![Some(ibase.clone())], iprovided.clone(), class_a(), "public", RegistrationInfo::None);
    registry.register_adapter(
        vec![Some(ibase.clone())],
        iprovided.clone(),
        Object::Function(Arc::new(Function::new("pkg.sub.foo", "_hidden"))),
        "private",
        RegistrationInfo::None,
    );
    registry.register_adapter(
        vec![Some(ibase.clone())],
        iprovided,
        Object::Class(Class::builder("pkg.missing", "Gone").build()),
        "missing",
        RegistrationInfo::None,
    );
    let intro = introspector_with(&dir, registry);

    for registration in required_adapters(&intro, &ibase, false) {
        let details = AdapterDetails::new(&intro, registration);
        let path = details.factory.clone().unwrap();
        assert_eq!(details.factory_url.is_some(), is_referencable(&intro, &path), "{path}");
    }
    let urls: Vec<Option<String>> = required_adapters(&intro, &ibase, false)
        .into_iter()
        .map(|r| AdapterDetails::new(&intro, r).factory_url)
        .collect();
    assert_eq!(urls, vec![Some("/++apidoc++/Code/pkg/sub/foo/A".to_string()), None, None]);
}

#[test]
fn test_registration_sources() {
    let dir = sample_tree();
    let ibase = iface("IBase");
    let info = ParserInfo {
        file: dir.path().join("pkg").join("configure.zcml"),
        line: 3,
        column: 2,
        eline: 5,
        ecolumn: 2,
    };
    let mut registry = ComponentRegistry::new();
    registry.register_adapter(
        vec![Some(ibase.clone()), None],
        iface("IProvided"),
        class_a(),
        "",
        RegistrationInfo::Parser(info),
    );
    let intro = introspector_with(&dir, registry);

    let registration = &intro.registry().registrations()[0];
    let details = AdapterDetails::new(&intro, registration);
    assert!(details.doc.is_none());
    let zcml = details.zcml.unwrap();
    assert_eq!(zcml.url.as_deref(), Some("pkg/configure.zcml"));
    assert_eq!((zcml.line, zcml.column, zcml.eline, zcml.ecolumn), (3, 2, 5, 2));
    assert_eq!(details.required, vec![InterfaceInfo::new(&ibase)]);
    assert_eq!(details.provided.map(|p| p.path()).as_deref(), Some("tests.interfaces.IProvided"));

    let outside = ParserInfoDetails::new(
        &intro,
        &ParserInfo {
            file: PathBuf::from("/elsewhere/site.zcml"),
            line: 1,
            column: 0,
            eline: 1,
            ecolumn: 0,
        },
    );
    assert!(outside.url.is_none());
}
