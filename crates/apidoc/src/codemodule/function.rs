use crate::utilities::get_function_signature;
use object_model::Function;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A module-level function of the code browser.
pub struct FunctionNode {
    path: String,
    function: Arc<Function>,
}

impl FunctionNode {
    pub fn new(path: impl Into<String>, function: Arc<Function>) -> Self {
        Self {
            path: path.into(),
            function,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn function(&self) -> &Arc<Function> {
        &self.function
    }

    pub fn doc(&self) -> &str {
        &self.function.doc
    }

    pub fn signature(&self) -> String {
        get_function_signature(&self.function, false)
    }

    /// Function attributes, by name and `repr`.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.function.attributes
    }
}
