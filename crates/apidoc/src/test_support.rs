//! A small application on disk shared by the unit tests.

use crate::introspector::{Introspector, Settings};
use object_model::{ComponentRegistry, ConfigurationContext, Importer, SourceImporter, StaticImporter};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn sample_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "pkg/__init__.py", "\"\"\"The sample package.\"\"\"\n");
    write(
        root,
        "pkg/interfaces.py",
        r#""""Interfaces of the sample package."""

from zope.interface import Interface, Attribute
from zope.schema import TextLine

class IFoo(Interface):
    """Foo things."""

    title = TextLine(title=u"Title", required=False)

    def bar():
        """Do the bar thing."""

class IBar(IFoo):
    """A more specific foo."""
"#,
    );
    write(root, "pkg/README.txt", "The sample package\n==================\n\nSee ``pkg.sub``.\n");
    write(
        root,
        "pkg/configure.zcml",
        r#"<configure xmlns="http://namespaces.zope.org/zope">
  <include package=".sub" />
</configure>
"#,
    );
    write(root, "pkg/broken.zcml", "<configure>\n  <include>\n</configure>\n");
    write(root, "pkg/tests.py", "import unittest\n");
    write(root, "pkg/setup.py", "x = 1\n");
    write(root, "pkg/sub/__init__.py", "");
    write(
        root,
        "pkg/sub/foo.py",
        r#"from zope.interface import implementer
from pkg.interfaces import IFoo

@implementer(IFoo)
class A(object):
    """The A class."""

    color = 'red'

    def __init__(self, name, size=10):
        """Create an A."""

    def bar(self):
        """Bar an A."""

def helper(a, b=1, *args, **kw):
    "Help."

def _hidden():
    pass
"#,
    );
    write(
        root,
        "pkg/sub/bar.py",
        r#"from pkg.sub.foo import A
from zope.interface import implementer
from pkg.interfaces import IBar

@implementer(IBar)
class B(A):
    """A more specific A."""
"#,
    );
    dir
}

pub fn importer(dir: &TempDir) -> Arc<dyn Importer> {
    let builtins: Arc<dyn Importer> = Arc::new(StaticImporter::with_builtins());
    Arc::new(SourceImporter::new(vec![dir.path().to_path_buf()]).with_fallback(builtins))
}

pub fn settings(dir: &TempDir) -> Settings {
    Settings {
        roots: vec!["pkg".to_string()],
        search_paths: vec![dir.path().to_path_buf()],
        ..Settings::default()
    }
}

pub fn introspector_with(dir: &TempDir, registry: ComponentRegistry) -> Arc<Introspector> {
    let importer = importer(dir);
    let context = ConfigurationContext::new(importer.clone());
    Arc::new(
        Introspector::new(importer, Arc::new(context), Arc::new(registry)).with_settings(settings(dir)),
    )
}

pub fn introspector(dir: &TempDir) -> Arc<Introspector> {
    introspector_with(dir, ComponentRegistry::new())
}
