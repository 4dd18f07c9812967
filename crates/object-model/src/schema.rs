//! Schema fields declared by interfaces.
//!
//! A field is an interface attribute that additionally describes the type of
//! value it accepts. Directive schemas are interfaces made of fields, so the
//! field kind also decides whether a directive attribute refers to another
//! object (`GlobalObject`, `GlobalInterface`, or `Tokens` of those).

use serde::Serialize;
use strum::{Display, EnumString};

/// The field classes known to the documentation browser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    Simple(SimpleField),
    GlobalObject,
    GlobalInterface,
    Tokens(Box<FieldKind>),
    /// A field class the browser has no special knowledge about, by dotted path.
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
pub enum SimpleField {
    Text,
    TextLine,
    Bytes,
    BytesLine,
    Bool,
    Int,
    Float,
    Choice,
    List,
    Tuple,
    Set,
    Dict,
    Datetime,
    Object,
    URI,
    Id,
    Path,
    MessageID,
    PythonIdentifier,
    Permission,
}

impl SimpleField {
    fn module(&self) -> &'static str {
        match self {
            SimpleField::Path
            | SimpleField::MessageID
            | SimpleField::PythonIdentifier
            | SimpleField::Permission => "zope.configuration.fields",
            _ => "zope.schema",
        }
    }

    fn interface_module(&self) -> &'static str {
        match self {
            SimpleField::Path
            | SimpleField::MessageID
            | SimpleField::PythonIdentifier
            | SimpleField::Permission => "zope.configuration.interfaces",
            _ => "zope.schema.interfaces",
        }
    }
}

impl FieldKind {
    /// Map a field class name (optionally dotted) onto a field kind.
    pub fn from_class_name(name: &str) -> FieldKind {
        let short = name.rsplit('.').next().unwrap_or(name);
        match short {
            "GlobalObject" => FieldKind::GlobalObject,
            "GlobalInterface" => FieldKind::GlobalInterface,
            "Tokens" => FieldKind::Tokens(Box::new(FieldKind::Simple(SimpleField::TextLine))),
            _ => match short.parse::<SimpleField>() {
                Ok(simple) => FieldKind::Simple(simple),
                Err(_) => FieldKind::Other(name.to_string()),
            },
        }
    }

    /// Dotted path of the field class.
    pub fn class_path(&self) -> String {
        match self {
            FieldKind::Simple(simple) => format!("{}.{simple}", simple.module()),
            FieldKind::GlobalObject => "zope.configuration.fields.GlobalObject".to_string(),
            FieldKind::GlobalInterface => "zope.configuration.fields.GlobalInterface".to_string(),
            FieldKind::Tokens(_) => "zope.configuration.fields.Tokens".to_string(),
            FieldKind::Other(path) => path.clone(),
        }
    }

    /// Short name of the field class.
    pub fn class_name(&self) -> String {
        let path = self.class_path();
        path.rsplit('.').next().unwrap_or(&path).to_string()
    }

    /// Dotted path of the interface the field class implements, if known.
    pub fn interface_path(&self) -> Option<String> {
        match self {
            FieldKind::Simple(simple) => Some(format!("{}.I{simple}", simple.interface_module())),
            FieldKind::GlobalObject => {
                Some("zope.configuration.interfaces.IGlobalObject".to_string())
            }
            FieldKind::GlobalInterface => {
                Some("zope.configuration.interfaces.IGlobalInterface".to_string())
            }
            FieldKind::Tokens(_) => Some("zope.configuration.interfaces.ITokens".to_string()),
            FieldKind::Other(_) => None,
        }
    }

    /// True when the literal value of such a field names another object.
    pub fn is_object_reference(&self) -> bool {
        match self {
            FieldKind::GlobalObject | FieldKind::GlobalInterface => true,
            FieldKind::Tokens(value_type) => value_type.is_object_reference(),
            _ => false,
        }
    }

    pub fn is_tokens(&self) -> bool {
        matches!(self, FieldKind::Tokens(_))
    }
}

/// A schema field declared on an interface.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub title: String,
    pub description: String,
    pub required: bool,
    /// `repr` of the default value, when one is declared.
    pub default: Option<String>,
    /// Declaration order within the interface.
    pub order: usize,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            title: String::new(),
            description: String::new(),
            required: true,
            default: None,
            order: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Text shown as the field documentation: title and description joined.
    pub fn doc(&self) -> String {
        match (self.title.is_empty(), self.description.is_empty()) {
            (false, false) => format!("{}\n\n{}", self.title, self.description),
            (false, true) => self.title.clone(),
            (true, _) => self.description.clone(),
        }
    }
}
