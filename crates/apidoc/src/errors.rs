//! Error types for the apidoc crate

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApidocError>;

#[derive(Error, Debug)]
pub enum ApidocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Object model error: {0}")]
    ObjectModel(#[from] object_model::ObjectModelError),

    /// A container lookup that must succeed did not.
    #[error("Key not present: {0}")]
    KeyNotFound(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A configuration file that could not be parsed.
///
/// Kept on the file node, so it has to be cheap to clone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{file}:{line}:{column}: {message}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}
