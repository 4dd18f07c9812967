use crate::interface::Interface;
use crate::object::Object;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An imported module or package.
#[derive(Debug)]
pub struct Module {
    path: String,
    file: Option<PathBuf>,
    doc: String,
    docformat: Option<String>,
    search_paths: Vec<PathBuf>,
    all: Option<Vec<String>>,
    provides: Vec<Arc<Interface>>,
    members: Vec<(String, Object)>,
}

impl Module {
    pub fn builder(path: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            module: Module {
                path: path.into(),
                file: None,
                doc: String::new(),
                docformat: None,
                search_paths: Vec::new(),
                all: None,
                provides: Vec::new(),
                members: Vec::new(),
            },
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last segment of the dotted path.
    pub fn short_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// The declared `__docformat__`, if any.
    pub fn docformat(&self) -> Option<&str> {
        self.docformat.as_deref()
    }

    /// A module is a package when its file is an `__init__` compilation unit.
    pub fn is_package(&self) -> bool {
        self.file
            .as_deref()
            .and_then(|file| file.file_stem())
            .is_some_and(|stem| stem == "__init__")
    }

    /// Directories searched for sub-modules. Defaults to the package directory.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        match (&self.file, self.is_package()) {
            (Some(file), true) => file.parent().map(Path::to_path_buf).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// The explicit export list (`__all__`).
    pub fn all(&self) -> Option<&[String]> {
        self.all.as_deref()
    }

    /// Interfaces directly provided by the module object.
    pub fn provides(&self) -> &[Arc<Interface>] {
        &self.provides
    }

    pub fn member(&self, name: &str) -> Option<&Object> {
        self.members
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn members(&self) -> &[(String, Object)] {
        &self.members
    }

    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|(name, _)| name.clone()).collect()
    }
}

pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.module.file = Some(file.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.module.doc = doc.into();
        self
    }

    pub fn docformat(mut self, docformat: impl Into<String>) -> Self {
        self.module.docformat = Some(docformat.into());
        self
    }

    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.module.search_paths.push(path.into());
        self
    }

    pub fn all(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.module.all = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn provides(mut self, iface: Arc<Interface>) -> Self {
        self.module.provides.push(iface);
        self
    }

    /// Bind a name in the module namespace. Rebinding replaces the old value.
    pub fn member(mut self, name: impl Into<String>, value: Object) -> Self {
        let name = name.into();
        if let Some(slot) = self.module.members.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.module.members.push((name, value));
        }
        self
    }

    pub fn build(self) -> Arc<Module> {
        Arc::new(self.module)
    }
}
