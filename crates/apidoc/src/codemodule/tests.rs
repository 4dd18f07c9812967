use super::*;
use crate::location::Located;
use crate::test_support::{introspector, sample_tree};
use object_model::resolve;
use object_model::{ComponentRegistry, ConfigurationContext};
use tracing_test::traced_test;

fn code_root(intro: &Arc<Introspector>) -> Arc<Located> {
    Located::root("Code", DocNode::Code(Arc::new(CodeModule::new(intro.clone()))))
}

fn class_node(located: &Located) -> &Arc<ClassNode> {
    match located.node() {
        DocNode::Class(class) => class,
        other => panic!("expected a class, got {other:?}"),
    }
}

#[test]
fn test_class_is_reachable_and_registered() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let code = code_root(&intro);

    let a = code
        .get("pkg")
        .and_then(|pkg| pkg.get("sub"))
        .and_then(|sub| sub.get("foo"))
        .and_then(|foo| foo.get("A"))
        .unwrap();
    let node = class_node(&a);
    assert_eq!(node.path(), "pkg.sub.foo.A");
    assert_eq!(node.doc(), "The A class.");

    let registered = intro.classes().get("pkg.sub.foo.A").unwrap();
    assert!(Arc::ptr_eq(&registered, node.class()));
}

#[test]
fn test_known_subclasses() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let code = code_root(&intro);

    let a = code.traverse("pkg/sub/foo/A").unwrap();
    assert!(class_node(&a).known_subclasses().is_empty());

    // Listing the package sets up the `bar` module and with it `B`.
    code.traverse("pkg/sub/bar").unwrap().items();
    let subclasses: Vec<String> = class_node(&a)
        .known_subclasses()
        .into_iter()
        .map(|(path, _)| path)
        .collect();
    assert_eq!(subclasses, vec!["pkg.sub.bar.B"]);
}

#[test]
fn test_package_children() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let code = code_root(&intro);

    assert_eq!(code.keys(), vec!["pkg"]);
    let pkg = code.index("pkg").unwrap();
    assert_eq!(
        pkg.keys(),
        vec!["README.txt", "broken.zcml", "configure.zcml", "interfaces", "sub"]
    );
    assert!(matches!(pkg.get("README.txt").unwrap().node(), DocNode::TextFile(_)));
    assert!(matches!(pkg.get("configure.zcml").unwrap().node(), DocNode::ZcmlFile(_)));

    let interfaces = pkg.index("interfaces").unwrap();
    assert_eq!(interfaces.keys(), vec!["IBar", "IFoo"]);
    assert!(matches!(interfaces.get("IFoo").unwrap().node(), DocNode::Interface(_)));
}

#[test]
fn test_private_names_resolve_but_are_not_listed() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let foo = code_root(&intro).traverse("pkg/sub/foo").unwrap();

    assert_eq!(foo.keys(), vec!["A", "helper"]);
    assert!(foo.get("_hidden").is_some());
    assert!(foo.contains("_hidden"));
    assert!(foo.get("missing").is_none());
    assert!(foo.index("missing").is_err());
}

#[test]
fn test_lookup_fallback_chain() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let code = code_root(&intro);

    // Unknown top-level modules are not imported unless allowed.
    assert!(code.get("zope").is_none());

    // Imported names are not listed but resolve as module attributes.
    let bar = code.traverse("pkg/sub/bar").unwrap();
    assert_eq!(bar.keys(), vec!["B"]);
    assert!(matches!(bar.get("IBar").unwrap().node(), DocNode::Interface(_)));
    assert!(matches!(bar.get("A").unwrap().node(), DocNode::Class(_)));
}

#[test]
fn test_unlisted_submodule_is_built_once() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let pkg = code_root(&intro).traverse("pkg").unwrap();

    // Ignored files are not children, but still import on lookup.
    assert!(!pkg.keys().contains(&"tests".to_string()));
    let first = pkg.get("tests").unwrap();
    let second = pkg.get("tests").unwrap();
    assert!(matches!(first.node(), DocNode::Module(_)));
    assert!(first.node().same_as(second.node()));
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_class_members() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let a = code_root(&intro).traverse("pkg/sub/foo/A").unwrap();
    let node = class_node(&a);

    let attributes: Vec<String> = node.attributes().into_iter().map(|m| m.name).collect();
    assert_eq!(attributes, vec!["color"]);

    let methods = node.methods();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].name, "bar");
    assert_eq!(
        methods[0].interface.as_ref().map(|iface| iface.path()).as_deref(),
        Some("pkg.interfaces.IFoo")
    );

    let direct: Vec<String> = node.direct_interfaces().iter().map(|i| i.path()).collect();
    let all: Vec<String> = node.interfaces().iter().map(|i| i.path()).collect();
    assert!(direct.iter().all(|path| all.contains(path)));
    assert!(node.constructor().is_some());
    assert!(node.security_checker().is_none());
}

#[test]
fn test_attribute_declared_in_base_interface() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let ibase = object_model::Interface::builder("pkg.interfaces", "IBase")
        .attribute("base_attr", "Declared by the base.")
        .build();
    let iderived = object_model::Interface::builder("pkg.interfaces", "IDerived")
        .base(ibase)
        .build();
    let class = object_model::Class::builder("pkg.k", "K")
        .implements(iderived)
        .attribute("base_attr", object_model::Object::value("1", "int"))
        .build();

    let node = ClassNode::new(&intro, "pkg.k.K", class);
    let attributes = node.attributes();
    assert_eq!(attributes.len(), 1);
    assert_eq!(
        attributes[0].interface.as_ref().map(|iface| iface.path()).as_deref(),
        Some("pkg.interfaces.IBase")
    );
}

#[test]
fn test_function_node() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let helper = code_root(&intro).traverse("pkg/sub/foo/helper").unwrap();
    let DocNode::Function(function) = helper.node() else {
        panic!("expected a function");
    };
    assert_eq!(function.path(), "pkg.sub.foo.helper");
    assert_eq!(function.doc(), "Help.");
    assert_eq!(function.signature(), "(a, b=1, *args, **kw)");
    assert!(function.attributes().is_empty());
}

#[test]
fn test_files() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let pkg = code_root(&intro).traverse("pkg").unwrap();

    let DocNode::TextFile(readme) = pkg.index("README.txt").unwrap().node().clone() else {
        panic!("expected a text file");
    };
    assert!(readme.content().starts_with("The sample package"));
    assert_eq!(readme.format(), crate::utilities::DocFormat::Structured);

    let DocNode::ZcmlFile(configure) = pkg.index("configure.zcml").unwrap().node().clone() else {
        panic!("expected a configuration file");
    };
    assert_eq!(configure.package(), "pkg");
    let root = configure.parse().unwrap();
    assert_eq!(root.name.name, "configure");
    // Parsed once, shared afterwards.
    assert!(Arc::ptr_eq(&root, &configure.parse().unwrap()));

    let DocNode::ZcmlFile(broken) = pkg.index("broken.zcml").unwrap().node().clone() else {
        panic!("expected a configuration file");
    };
    assert!(broken.parse().is_err());
    assert!(broken.content().contains("<include>"));
}

#[test]
fn test_classes_implementing_after_setup() {
    let dir = sample_tree();
    let intro = introspector(&dir);
    let code = code_root(&intro);
    code.traverse("pkg/sub/foo").unwrap().items();
    code.traverse("pkg/sub/bar").unwrap().items();

    let ifoo = resolve(intro.importer(), "pkg.interfaces.IFoo")
        .and_then(|o| o.as_interface().cloned())
        .unwrap();
    let implementing: Vec<String> = intro
        .classes()
        .classes_implementing(&ifoo)
        .into_iter()
        .map(|(path, _)| path)
        .collect();
    assert_eq!(implementing, vec!["pkg.sub.bar.B", "pkg.sub.foo.A"]);
}

#[test]
#[traced_test]
fn test_unimportable_roots_are_skipped() {
    let dir = sample_tree();
    let importer = crate::test_support::importer(&dir);
    let context = ConfigurationContext::new(importer.clone());
    let mut settings = crate::test_support::settings(&dir);
    settings.roots.push("nothing".to_string());
    let intro = Arc::new(
        Introspector::new(importer, Arc::new(context), Arc::new(ComponentRegistry::new())).with_settings(settings),
    );

    let code = code_root(&intro);
    assert_eq!(code.keys(), vec!["pkg"]);
    assert!(code.get("nothing").is_none());
    assert!(logs_contain("Root module `nothing` cannot be imported"));
}
