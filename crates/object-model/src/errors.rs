//! Error types for the object-model crate

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for object model operations
pub type Result<T> = std::result::Result<T, ObjectModelError>;

#[derive(Error, Debug)]
pub enum ObjectModelError {
    /// IO operations failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A registration manifest could not be read
    #[error("Failed to load registration manifest {path:?}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    /// A dotted name did not resolve to an object
    #[error("Could not resolve '{0}'")]
    Unresolved(String),

    /// A dotted name resolved, but to an object of the wrong kind
    #[error("'{path}' is not an {expected}")]
    WrongKind { path: String, expected: &'static str },
}
