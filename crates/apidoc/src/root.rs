//! The documentation root: the enabled documentation modules, by key.

use crate::codemodule::CodeModule;
use crate::ifacemodule::InterfaceModule;
use crate::introspector::Introspector;
use crate::location::{Container, DocNode};
use crate::utilitymodule::UtilityModule;
use crate::zcmlmodule::ZcmlModule;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

pub struct RootContainer {
    intro: Arc<Introspector>,
    modules: BTreeMap<String, DocNode>,
}

impl RootContainer {
    pub fn new(intro: Arc<Introspector>) -> Self {
        let mut modules = BTreeMap::new();
        for key in &intro.settings().modules {
            let node = match key.as_str() {
                "Code" => DocNode::Code(Arc::new(CodeModule::new(intro.clone()))),
                "Interface" => DocNode::Interfaces(Arc::new(InterfaceModule::new(intro.clone()))),
                "Utility" => DocNode::Utilities(Arc::new(UtilityModule::new(intro.clone()))),
                "ZCML" => DocNode::Zcml(Arc::new(ZcmlModule::new(intro.clone()))),
                other => {
                    warn!("Unknown documentation module `{other}`");
                    continue;
                }
            };
            modules.insert(key.clone(), node);
        }
        Self { intro, modules }
    }

    pub fn introspector(&self) -> &Arc<Introspector> {
        &self.intro
    }
}

impl Container for RootContainer {
    fn lookup(&self, key: &str) -> Option<DocNode> {
        self.modules.get(key).cloned()
    }

    fn entries(&self) -> Vec<(String, DocNode)> {
        self.modules
            .iter()
            .map(|(key, node)| (key.clone(), node.clone()))
            .collect()
    }
}
