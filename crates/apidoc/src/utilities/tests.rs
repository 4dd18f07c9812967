use super::*;
use crate::introspector::Settings;
use object_model::{
    ComponentRegistry, ConfigurationContext, Importer, Instance, Module, Permission, StaticImporter,
};

fn introspector() -> Introspector {
    let ifoo = Interface::builder("pkg.interfaces", "IFoo")
        .attribute("title", "The title")
        .build();
    let foo = Class::builder("pkg.impl", "Foo").implements(ifoo.clone()).build();
    let singleton = Class::builder("pkg.impl", "Singleton").build();
    let importer: Arc<dyn Importer> = Arc::new(
        StaticImporter::with_builtins()
            .with(Module::builder("pkg").build())
            .with(
                Module::builder("pkg.interfaces")
                    .member("IFoo", Object::Interface(ifoo))
                    .build(),
            )
            .with(
                Module::builder("pkg.impl")
                    .member("Foo", Object::Class(foo.clone()))
                    .member("_Hidden", Object::Class(Class::builder("pkg.impl", "_Hidden").build()))
                    .member("__version__", Object::value("'1.0'", "str"))
                    .member(
                        "Singleton",
                        Object::Instance(Arc::new(Instance::new(singleton).bound_to("pkg.impl", "Singleton"))),
                    )
                    .member(
                        "default_foo",
                        Object::Instance(Arc::new(Instance::new(foo).bound_to("pkg.impl", "default_foo"))),
                    )
                    .build(),
            )
            .with(Module::builder("pkg.tests").build()),
    );
    let context = Arc::new(ConfigurationContext::new(importer.clone()));
    Introspector::new(importer, context, Arc::new(ComponentRegistry::new())).with_settings(Settings {
        ignore: vec!["pkg.tests".to_string()],
        ..Settings::default()
    })
}

#[test]
fn test_get_path() {
    let class = Class::builder("pkg.impl", "Outer.Inner").build();
    assert_eq!(get_path(&Object::Class(class)).as_deref(), Some("pkg.impl.Outer"));

    let method = Function::new("pkg.impl", "Foo.run").with_owner("pkg.impl.Foo");
    assert_eq!(
        get_path(&Object::Function(Arc::new(method))).as_deref(),
        Some("pkg.impl.Foo")
    );

    let inner = Arc::new(Function::new("pkg.impl", "helper"));
    let hook = Function::new("pkg.hooks", "hook").wrapping(inner);
    assert_eq!(
        get_path(&Object::Function(Arc::new(hook))).as_deref(),
        Some("pkg.impl.helper")
    );

    assert_eq!(get_path(&Object::value("1", "int")), None);
    let iface = Interface::builder("pkg.interfaces", "IFoo").build();
    assert_eq!(get_path(&Object::Interface(iface)).as_deref(), Some("pkg.interfaces.IFoo"));
}

#[test]
fn test_is_referencable() {
    let intro = introspector();
    assert!(is_referencable(&intro, "pkg.impl.Foo"));
    assert!(is_referencable(&intro, "pkg.impl"));
    assert!(is_referencable(&intro, "pkg"));
    assert!(is_referencable(&intro, "pkg.impl.__version__"));
    assert!(is_referencable(&intro, "pkg.impl.default_foo"));

    // ignored
    assert!(!is_referencable(&intro, "pkg.tests"));
    // module does not import
    assert!(!is_referencable(&intro, "pkg.missing.Foo"));
    // name missing on the module
    assert!(!is_referencable(&intro, "pkg.impl.Bar"));
    // private
    assert!(!is_referencable(&intro, "pkg.impl._Hidden"));
    // singleton replacing its class
    assert!(!is_referencable(&intro, "pkg.impl.Singleton"));
    assert!(!is_referencable(&intro, ""));
}

#[test]
fn test_function_signature() {
    let function = Function::new("pkg", "f").with_params(vec![
        Param::positional("self"),
        Param::positional("a"),
        Param::Unpack(vec![Param::positional("b"), Param::positional("c")]),
        Param::KwArgs("kw".into()),
        Param::with_default("d", "1"),
        Param::VarArgs("args".into()),
    ]);
    assert_eq!(get_function_signature(&function, false), "(self, a, (b, c), d=1, *args, **kw)");
    assert_eq!(get_function_signature(&function, true), "(a, (b, c), d=1, *args, **kw)");

    let bound = Function::new("pkg", "g")
        .with_params(vec![Param::positional("self"), Param::with_default("x", "'y'")])
        .bound();
    assert_eq!(get_function_signature(&bound, false), "(x='y')");

    let keyword_only = Function::new("pkg", "h").with_params(vec![
        Param::positional("a"),
        Param::KeywordOnly {
            name: "key".into(),
            default: Some("None".into()),
        },
    ]);
    assert_eq!(get_function_signature(&keyword_only, false), "(a, *, key=None)");
    assert_eq!(get_function_signature(&Function::new("pkg", "i"), true), "()");
}

#[test]
fn test_public_attributes() {
    let class = Class::builder("pkg", "A")
        .attribute("visible", Object::value("1", "int"))
        .attribute("_hidden", Object::value("2", "int"))
        .method(Function::new("pkg", "A.run"))
        .build();
    assert_eq!(get_public_attributes(&Object::Class(class)), vec!["run", "visible"]);

    // Names declared by an interface are not attributes of the interface object.
    let iface = Interface::builder("pkg", "IA").attribute("a", "").build();
    assert!(get_public_attributes(&Object::Interface(iface)).is_empty());
}

#[test]
fn test_interface_for_attribute() {
    let ibase = Interface::builder("pkg", "IBase").attribute("base_attr", "").build();
    let iderived = Interface::builder("pkg", "IDerived")
        .base(ibase.clone())
        .attribute("derived_attr", "")
        .build();
    let interfaces = [iderived.clone()];

    assert_eq!(
        get_interface_path_for_attribute("derived_attr", InterfaceSource::Interfaces(&interfaces)).as_deref(),
        Some("pkg.IDerived")
    );
    assert!(get_interface_for_attribute("base_attr", InterfaceSource::Interfaces(&interfaces)).is_none());

    let class = Class::builder("pkg", "Impl").implements(iderived).build();
    let found = get_interface_for_attribute("base_attr", InterfaceSource::Class(&class)).unwrap();
    assert!(Arc::ptr_eq(&found, &ibase));
    assert!(get_interface_for_attribute("missing", InterfaceSource::Class(&class)).is_none());
}

#[test]
fn test_permission_ids() {
    let checker = Checker::new()
        .allow_read("title", Permission::Public)
        .allow_write("title", Permission::Named("zope.ManageContent".into()));

    assert_eq!(
        get_permission_ids("title", Some(&checker)),
        PermissionIds {
            read_perm: Some("zope.Public".into()),
            write_perm: Some("zope.ManageContent".into()),
        }
    );
    assert_eq!(
        get_permission_ids("other", Some(&checker)),
        PermissionIds {
            read_perm: Some("n/a".into()),
            write_perm: Some("n/a".into()),
        }
    );
    assert_eq!(get_permission_ids("title", None), PermissionIds::default());
}

#[test]
fn test_columnize() {
    let columns = columnize((1..=7).collect(), 3);
    assert_eq!(columns, vec![vec![1, 2, 3], vec![4, 5], vec![6, 7]]);

    let columns = columnize((1..=6).collect(), 3);
    assert_eq!(columns, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);

    let columns = columnize(vec!["a", "b"], 3);
    assert_eq!(columns, vec![vec!["a"], vec!["b"]]);

    assert!(columnize(Vec::<u8>::new(), 3).is_empty());
}
