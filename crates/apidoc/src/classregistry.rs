//! The class registry: every class seen while building the code tree,
//! keyed by dotted path.
//!
//! The registry only grows while the documentation is browsed. [`clear`]
//! exists for resets between test runs.
//!
//! [`clear`]: ClassRegistry::clear

use object_model::{Class, Interface};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<BTreeMap<String, Arc<Class>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class; a second insert for the same path overwrites.
    pub fn insert(&self, path: impl Into<String>, class: Arc<Class>) {
        if let Ok(mut classes) = self.classes.write() {
            classes.insert(path.into(), class);
        }
    }

    pub fn get(&self, path: &str) -> Option<Arc<Class>> {
        self.classes.read().ok()?.get(path).cloned()
    }

    /// Classes whose instances provide `iface`, sorted by path.
    pub fn classes_implementing(&self, iface: &Interface) -> Vec<(String, Arc<Class>)> {
        self.select(|class| iface.implemented_by(class))
    }

    /// Strict subclasses of `class`, sorted by path.
    pub fn subclasses_of(&self, class: &Class) -> Vec<(String, Arc<Class>)> {
        self.select(|candidate| candidate.as_ref() != class && candidate.is_subclass_of(class))
    }

    pub fn len(&self) -> usize {
        self.classes.read().map(|classes| classes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut classes) = self.classes.write() {
            classes.clear();
        }
    }

    fn select(&self, predicate: impl Fn(&Arc<Class>) -> bool) -> Vec<(String, Arc<Class>)> {
        let Ok(classes) = self.classes.read() else {
            return Vec::new();
        };
        classes
            .iter()
            .filter(|(_, class)| predicate(class))
            .map(|(path, class)| (path.clone(), class.clone()))
            .collect()
    }
}
