use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One entry of a callable's parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Param {
    /// A positional-or-keyword parameter, with the `repr` of its default.
    Positional { name: String, default: Option<String> },
    /// A tuple-unpacking parameter, e.g. `(a, b)`.
    Unpack(Vec<Param>),
    /// `*args`
    VarArgs(String),
    /// A keyword-only parameter following `*` or `*args`.
    KeywordOnly { name: String, default: Option<String> },
    /// `**kw`
    KwArgs(String),
}

impl Param {
    pub fn positional(name: impl Into<String>) -> Self {
        Param::Positional {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        Param::Positional {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

/// A function or method.
#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub module: String,
    /// Qualified name; nested scopes are separated by dots.
    pub qualname: String,
    pub doc: String,
    pub params: Vec<Param>,
    /// Function attributes (`fn.__dict__`), by name and `repr`.
    pub attributes: BTreeMap<String, String>,
    /// Dotted path of the class that declares this method.
    pub owner: Option<String>,
    /// Bound to an instance; the receiver is not part of the signature.
    pub bound: bool,
    /// Implemented natively; shown as a method descriptor.
    pub builtin: bool,
    /// The implementation behind a hook or decorator wrapper.
    #[serde(skip)]
    pub wrapped: Option<Arc<Function>>,
}

impl Function {
    pub fn new(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            qualname: qualname.into(),
            doc: String::new(),
            params: Vec::new(),
            attributes: BTreeMap::new(),
            owner: None,
            bound: false,
            builtin: false,
            wrapped: None,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, repr: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), repr.into());
        self
    }

    pub fn bound(mut self) -> Self {
        self.bound = true;
        self
    }

    pub fn builtin(mut self) -> Self {
        self.builtin = true;
        self
    }

    pub fn wrapping(mut self, wrapped: Arc<Function>) -> Self {
        self.wrapped = Some(wrapped);
        self
    }

    /// The simple name (last segment of the qualified name).
    pub fn name(&self) -> &str {
        self.qualname.rsplit('.').next().unwrap_or(&self.qualname)
    }

    /// Follow hook wrappers down to the underlying implementation.
    pub fn implementation(self: &Arc<Self>) -> Arc<Function> {
        let mut current = self.clone();
        while let Some(inner) = current.wrapped.clone() {
            current = inner;
        }
        current
    }
}
