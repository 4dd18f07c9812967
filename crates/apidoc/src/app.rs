//! The documentation application: an introspector and the tree rooted in it.

use crate::introspector::Introspector;
use crate::location::{DocNode, Located};
use crate::root::RootContainer;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Name of the documentation root, as it appears in URLs.
pub const ROOT_NAME: &str = "++apidoc++";

pub struct Apidoc {
    intro: Arc<Introspector>,
    root: RwLock<Arc<Located>>,
}

impl std::fmt::Debug for Apidoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Apidoc").field("intro", &self.intro).finish()
    }
}

impl Apidoc {
    pub fn new(intro: Introspector) -> Self {
        let intro = Arc::new(intro);
        let root = build_root(&intro);
        Self {
            intro,
            root: RwLock::new(root),
        }
    }

    pub fn introspector(&self) -> &Arc<Introspector> {
        &self.intro
    }

    pub fn devmode(&self) -> bool {
        self.intro.settings().devmode
    }

    pub fn base_url(&self) -> &str {
        &self.intro.settings().base_url
    }

    pub fn root(&self) -> Arc<Located> {
        self.root
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The documentation object at a `/`-separated path below the root.
    pub fn traverse(&self, path: &str) -> Option<Arc<Located>> {
        self.root().traverse(path)
    }

    pub fn url(&self, located: &Located) -> String {
        located.url(self.base_url())
    }

    /// Forget everything set up so far: registered classes, module
    /// children, parsed files and the directive index.
    pub fn reset(&self) {
        self.intro.classes().clear();
        let root = build_root(&self.intro);
        *self
            .root
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = root;
        info!("Documentation tree reset");
    }
}

fn build_root(intro: &Arc<Introspector>) -> Arc<Located> {
    Located::root(ROOT_NAME, DocNode::Root(Arc::new(RootContainer::new(intro.clone()))))
}
