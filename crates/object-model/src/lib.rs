//! The object model documented by apidoc.
//!
//! Applications are described by immutable records (modules, classes,
//! functions, interfaces and plain values), a component registry and a
//! snapshot of the configuration directives. Records are produced by an
//! [`Importer`]: either an in-memory table or a scanner over source trees
//! that never executes the code it reads.

pub mod checker;
pub mod class;
pub mod context;
pub mod errors;
pub mod function;
pub mod importer;
pub mod interface;
pub mod manifest;
pub mod module;
pub mod object;
pub mod registry;
mod ro;
pub mod schema;
pub mod source;
pub mod wellknown;

pub use checker::{Checker, Permission};
pub use class::Class;
pub use context::{ConfigurationContext, DirectiveEntry, DirectiveKind};
pub use errors::{ObjectModelError, Result};
pub use function::{Function, Param};
pub use importer::{ChainImporter, Importer, StaticImporter, resolve};
pub use interface::{Interface, InterfaceMember, Method};
pub use manifest::RegistryManifest;
pub use module::Module;
pub use object::{Factory, Instance, Object, ObjectKind, Value};
pub use registry::{ComponentRegistry, ParserInfo, Registration, RegistrationInfo, RegistrationKind};
pub use schema::{Field, FieldKind, SimpleField};
pub use source::SourceImporter;
