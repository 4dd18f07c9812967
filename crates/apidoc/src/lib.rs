//! Introspective API documentation.
//!
//! The documentation of an application is a tree of lazily populated
//! containers rooted in [`Apidoc`]: the code browser, the interface and
//! utility indexes and the directive reference. [`views`] turns any node
//! of the tree into plain serializable records.

pub mod app;
pub mod classregistry;
pub mod codemodule;
pub mod component;
pub mod config;
pub mod errors;
pub mod ifacemodule;
pub mod introspector;
pub mod location;
pub mod metaconfig;
pub mod root;
pub mod utilities;
pub mod utilitymodule;
pub mod views;
pub mod zcml;
pub mod zcmlmodule;

#[cfg(test)]
mod test_support;

pub use app::{Apidoc, ROOT_NAME};
pub use config::{ApidocConfig, CONFIG_FILE_NAME};
pub use errors::{ApidocError, ParseError, Result};
pub use introspector::{Introspector, Settings};
pub use location::{Container, DocNode, DocumentationModule, Located};
pub use views::Page;
