use apidoc::component::{AdapterDetails, provided_adapters, required_adapters};
use apidoc::utilities::{get_function_signature, is_referencable};
use apidoc::views::{Details, DirectiveChild, Page};
use apidoc::zcml::parse_file;
use apidoc::{Apidoc, ApidocConfig, DocNode, Located};
use object_model::Interface;
use std::sync::Arc;
use testing::fixture::FixtureApp;

fn build(app: &FixtureApp) -> Apidoc {
    testing::logging::init_test_logging();
    ApidocConfig::load(&app.config_path()).unwrap().build().unwrap()
}

fn interface(apidoc: &Apidoc, path: &str) -> Arc<Interface> {
    let object = object_model::resolve(apidoc.introspector().importer(), path).unwrap();
    object.as_interface().cloned().unwrap()
}

/// Every location reachable from `located` within `depth` levels.
fn walk(located: &Arc<Located>, depth: usize, found: &mut Vec<Arc<Located>>) {
    found.push(located.clone());
    if depth == 0 {
        return;
    }
    for child in located.values() {
        walk(&child, depth - 1, found);
    }
}

#[test]
fn test_containers_are_uniform() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let mut found = Vec::new();
    walk(&apidoc.root(), 4, &mut found);
    assert!(found.len() > 20);

    for node in &found {
        let items = node.items();
        let keys: Vec<_> = items.iter().map(|(key, _)| key.clone()).collect();
        assert_eq!(node.keys(), keys, "keys of {node:?}");
        assert_eq!(node.values().len(), items.len());
        assert_eq!(node.len(), items.len());
        assert_eq!(node.is_empty(), items.is_empty());
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "items of {node:?} are sorted");
        for key in &keys {
            assert!(node.contains(key));
            assert!(node.get(key).is_some());
        }
        assert!(!node.contains("no-such-key"));
        assert!(node.index("no-such-key").is_err());
    }
}

#[test]
fn test_lookups_return_fresh_locations() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let module = apidoc.traverse("Code/shop").unwrap();

    let first = module.get("product").unwrap();
    let second = module.get("product").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    for wrapper in [&first, &second] {
        assert!(Arc::ptr_eq(wrapper.parent().unwrap(), &module));
        assert_eq!(wrapper.name(), "product");
    }
    assert!(first.node().same_as(second.node()));
}

#[test]
fn test_same_interface_under_several_paths() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let from_code = apidoc.traverse("Code/shop/interfaces/IProduct").unwrap();
    let from_index = apidoc.traverse("Interface/shop.interfaces.IProduct").unwrap();

    let (DocNode::Interface(a), DocNode::Interface(b)) = (from_code.node(), from_index.node()) else {
        panic!("expected interfaces");
    };
    assert_eq!(a, b);
    assert_eq!(apidoc.url(&from_code), "/++apidoc++/Code/shop/interfaces/IProduct");
    assert_eq!(apidoc.url(&from_index), "/++apidoc++/Interface/shop.interfaces.IProduct");
}

#[test]
fn test_class_registry_round_trip() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let mut found = Vec::new();
    walk(&apidoc.traverse("Code").unwrap(), 5, &mut found);

    let classes = apidoc.introspector().classes();
    let mut class_nodes = 0;
    for located in &found {
        if let DocNode::Class(node) = located.node() {
            class_nodes += 1;
            let registered = classes.get(node.path()).unwrap();
            assert!(Arc::ptr_eq(&registered, node.class()));
        }
    }
    assert_eq!(class_nodes, 4);

    let iproduct = interface(&apidoc, "shop.interfaces.IProduct");
    let implementing: Vec<_> = classes
        .classes_implementing(&iproduct)
        .into_iter()
        .map(|(path, class)| {
            assert!(iproduct.implemented_by(&class));
            path
        })
        .collect();
    assert_eq!(implementing, vec!["shop.product.Book", "shop.product.Product"]);

    let icatalog = interface(&apidoc, "shop.interfaces.ICatalog");
    let catalogs: Vec<_> = classes.classes_implementing(&icatalog).into_iter().map(|(path, _)| path).collect();
    assert_eq!(catalogs, vec!["shop.product.Catalog"]);
}

#[test]
fn test_factory_urls_only_for_referencable_paths() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let intro = apidoc.introspector();

    let registry = intro.registry();
    let details: Vec<AdapterDetails> = registry
        .adapters()
        .map(|registration| AdapterDetails::new(intro, registration))
        .collect();
    assert_eq!(details.len(), 3);
    for adapter in details {
        let path = adapter.factory.unwrap();
        assert_eq!(adapter.factory_url.is_some(), is_referencable(intro, &path), "{path}");
    }
}

#[test]
fn test_required_and_provided_adapters() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let intro = apidoc.introspector();
    let iproduct = interface(&apidoc, "shop.interfaces.IProduct");
    let ibook = interface(&apidoc, "shop.interfaces.IBook");

    // The adapter for IBook and the one for any object; the view is left out.
    assert_eq!(required_adapters(intro, &iproduct, false).len(), 2);
    assert_eq!(required_adapters(intro, &iproduct, true).len(), 3);
    assert_eq!(required_adapters(intro, &ibook, false).len(), 2);
    assert_eq!(provided_adapters(intro, &iproduct, false).len(), 1);
}

#[test]
fn test_signatures() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);

    let make_product = apidoc.traverse("Code/shop/product/make_product").unwrap();
    let DocNode::Function(function) = make_product.node() else {
        panic!("expected a function");
    };
    assert_eq!(function.signature(), "(name, price=0, *tags, **extra)");

    let product = apidoc.traverse("Code/shop/product/Product").unwrap();
    let DocNode::Class(class) = product.node() else {
        panic!("expected a class");
    };
    let constructor = class.constructor().unwrap();
    assert_eq!(get_function_signature(&constructor, true), "(name, price=0)");
}

#[test]
fn test_configuration_parsing_is_idempotent() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let file = app.source_path().join("shop/configure.zcml");
    let context = apidoc.introspector().context();

    let first = parse_file(&file, context, Some("shop")).unwrap();
    let second = parse_file(&file, context, Some("shop")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_class_page_by_url() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let located = apidoc.traverse("/Code/shop/product/Book/").unwrap();
    let DocNode::Class(class) = located.node() else {
        panic!("expected a class");
    };
    assert_eq!(class.path(), "shop.product.Book");
    assert_eq!(apidoc.url(&located), "/++apidoc++/Code/shop/product/Book");
    assert!(apidoc.traverse("Code/shop/product/Missing").is_none());
    assert!(apidoc.traverse("Nothing").is_none());
}

#[test]
fn test_private_and_ignored_names() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let product = apidoc.traverse("Code/shop/product").unwrap();
    assert_eq!(product.keys(), vec!["Book", "Catalog", "Product", "make_product"]);
    assert!(product.get("_private_helper").is_some());
    assert!(!is_referencable(apidoc.introspector(), "shop.product._private_helper"));
}

#[test]
fn test_class_page_permissions() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let located = apidoc.traverse("Code/shop/product/Product").unwrap();
    let page = Page::new(apidoc.introspector(), &located);
    let Details::Class(details) = page.details else {
        panic!("expected class details");
    };

    let price = details.attributes.iter().find(|a| a.name == "price").unwrap();
    assert_eq!(price.permissions.read_perm.as_deref(), Some("shop.View"));
    assert_eq!(price.permissions.write_perm.as_deref(), Some("shop.Edit"));
    let describe = details.methods.iter().find(|m| m.name == "describe").unwrap();
    assert_eq!(describe.permissions.read_perm.as_deref(), Some("zope.Public"));
    assert_eq!(describe.permissions.write_perm.as_deref(), Some("n/a"));
    assert_eq!(
        describe.interface.as_ref().map(|link| link.path.as_str()),
        Some("shop.interfaces.IProduct")
    );
}

#[test]
fn test_interface_page() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    // Set up the code tree so that implementations are known.
    let mut found = Vec::new();
    walk(&apidoc.traverse("Code").unwrap(), 3, &mut found);

    let located = apidoc.traverse("Interface/shop.interfaces.IProduct").unwrap();
    let page = Page::new(apidoc.introspector(), &located);
    let Details::Interface(details) = page.details else {
        panic!("expected interface details");
    };

    let fields: Vec<_> = details.fields.iter().map(|f| (f.name.as_str(), f.required)).collect();
    assert_eq!(fields, vec![("name", true), ("price", false), ("notes", false)]);
    assert_eq!(details.fields[1].default.as_deref(), Some("0"));
    let attributes: Vec<_> = details.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(attributes, vec!["sku"]);
    let methods: Vec<_> = details.methods.iter().map(|m| (m.name.as_str(), m.signature.as_str())).collect();
    assert_eq!(methods, vec![("describe", "(verbose=False)")]);

    assert!(details.required_adapters.specific.is_empty());
    assert_eq!(details.required_adapters.extended.len(), 1);
    assert_eq!(details.required_adapters.generic.len(), 1);
    assert_eq!(details.provided_adapters.len(), 1);
    assert_eq!(details.factories.len(), 1);
    assert_eq!(details.factories[0].title, "Book");

    let browser = details.views.iter().find(|b| b.request_type == "browser").unwrap();
    assert_eq!(browser.levels.specific.len(), 1);
    let view = &browser.levels.specific[0];
    assert_eq!(view.name, "index.html");
    assert_eq!(view.factory.as_deref(), Some("shop.browser.views.ProductView"));
    let zcml = view.zcml.as_ref().unwrap();
    assert_eq!(zcml.url.as_deref(), Some("shop/browser/configure.zcml"));
    assert_eq!((zcml.line, zcml.column, zcml.eline), (3, 2, 7));

    let classes: Vec<_> = details.classes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(classes, vec!["shop.product.Book", "shop.product.Product"]);
}

#[test]
fn test_utility_index() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let utilities = apidoc.traverse("Utility").unwrap();
    assert!(utilities.keys().contains(&"shop.interfaces.ICatalog".to_string()));

    let catalog = utilities.get("shop.interfaces.ICatalog").unwrap();
    assert_eq!(catalog.keys(), vec!["__noname__", "archive"]);

    let main = catalog.get("__noname__").unwrap();
    let page = Page::new(apidoc.introspector(), &main);
    let Details::Utility(details) = page.details else {
        panic!("expected utility details");
    };
    assert_eq!(details.interface.path, "shop.interfaces.ICatalog");
    assert_eq!(details.utility.path.as_deref(), Some("shop.product.Catalog"));
    assert_eq!(details.utility.url.as_deref(), Some("/++apidoc++/Code/shop/product/Catalog"));
    assert_eq!(details.utility.doc.as_deref(), Some("The main catalog."));
}

#[test]
fn test_directive_reference() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let zcml = apidoc.traverse("ZCML").unwrap();
    assert!(zcml.keys().contains(&"ALL".to_string()));
    assert!(zcml.contains("shop"));

    let product = apidoc.traverse("ZCML/shop/product").unwrap();
    let page = Page::new(apidoc.introspector(), &product);
    let Details::DirectiveSchema(details) = page.details else {
        panic!("expected directive details");
    };
    assert_eq!(details.short_namespace, "shop");
    assert_eq!(details.directive.schema.path, "shop.metadirectives.IProductDirective");
    assert_eq!(
        details.directive.handler.as_ref().map(|h| h.path.as_str()),
        Some("shop.metaconfigure.product")
    );
    assert!(apidoc.introspector().context().has_feature("shop"));
}

#[test]
fn test_configuration_file_cross_references() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let located = apidoc.traverse("Code/shop/configure.zcml").unwrap();
    let page = Page::new(apidoc.introspector(), &located);
    let Details::ZcmlFile(details) = page.details else {
        panic!("expected configuration file details");
    };
    let root = details.root.unwrap();
    assert!(matches!(&root.children[0], DirectiveChild::Comment { text } if text == "Products sold by the shop"));
    let DirectiveChild::Directive(product) = &root.children[1] else {
        panic!("expected a directive");
    };
    assert_eq!(product.tag, "shop:product");
    assert_eq!(
        product.schema_url.as_deref(),
        Some("/++apidoc++/ZCML/http_co__sl__sl_namespaces.zope.org_sl_shop/product")
    );

    let names: Vec<_> = product.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["class", "for", "name", "extra"]);
    let url = |index: usize, token: usize| {
        product.attributes[index].references.as_ref().unwrap()[token].url.clone()
    };
    assert_eq!(url(0, 0).as_deref(), Some("/++apidoc++/Code/shop/product/Book"));
    assert_eq!(url(1, 0).as_deref(), Some("/++apidoc++/Interface/shop.interfaces.IBook"));
    assert!(product.attributes[2].references.is_none());
    assert_eq!(url(3, 0).as_deref(), Some("/++apidoc++/Interface/shop.interfaces.IProduct"));
    assert_eq!(url(3, 1), None);
}

#[test]
fn test_reset_forgets_registered_classes() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let before = apidoc.root();
    apidoc.traverse("Code/shop/product/Book").unwrap();
    assert!(!apidoc.introspector().classes().is_empty());

    apidoc.reset();
    assert!(apidoc.introspector().classes().is_empty());
    assert!(!Arc::ptr_eq(&before, &apidoc.root()));

    // Listing the module registers every class it declares.
    apidoc.traverse("Code/shop/product/Book").unwrap();
    assert_eq!(apidoc.introspector().classes().len(), 3);
}

#[test]
fn test_unresolvable_registrations_are_skipped() {
    let app = FixtureApp::sample();
    let apidoc = build(&app);
    let registry = apidoc.introspector().registry();
    assert_eq!(registry.utilities_for(&interface(&apidoc, "shop.interfaces.ICatalog")).count(), 2);
    assert!(object_model::resolve(apidoc.introspector().importer(), "shop.missing.Catalog").is_none());
}
