//! The interface index: every interface registered as an `IInterface`
//! utility, keyed by dotted path.

use crate::introspector::Introspector;
use crate::location::{Container, DocNode, DocumentationModule};
use object_model::{Object, resolve};
use std::sync::Arc;
use tracing::debug;

pub struct InterfaceModule {
    intro: Arc<Introspector>,
}

impl InterfaceModule {
    pub fn new(intro: Arc<Introspector>) -> Self {
        Self { intro }
    }
}

impl Container for InterfaceModule {
    /// Registered interfaces first; any other importable interface resolves
    /// too, without being listed.
    fn lookup(&self, key: &str) -> Option<DocNode> {
        let registered = self
            .intro
            .registry()
            .interfaces()
            .into_iter()
            .find(|(name, _)| name == key);
        if let Some((_, iface)) = registered {
            return Some(DocNode::Interface(iface));
        }
        match resolve(self.intro.importer(), key) {
            Some(Object::Interface(iface)) => Some(DocNode::Interface(iface)),
            Some(other) => {
                debug!("`{key}` is a {:?}, not an interface", other.kind());
                None
            }
            None => None,
        }
    }

    fn entries(&self) -> Vec<(String, DocNode)> {
        let mut entries: Vec<(String, DocNode)> = self
            .intro
            .registry()
            .interfaces()
            .into_iter()
            .map(|(name, iface)| (name, DocNode::Interface(iface)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|a, b| a.0 == b.0);
        entries
    }
}

impl DocumentationModule for InterfaceModule {
    fn title(&self) -> &str {
        "Interfaces"
    }

    fn description(&self) -> &str {
        "All used and important interfaces are registered through the site \
         manager. While it would be possible to just list all attributes, it is \
         hard on the user to read such an overfull list. Therefore, interfaces \
         that have partial common module paths are bound together."
    }
}
