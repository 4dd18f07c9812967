//! Error types for the static-export crate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request for {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL `{0}`")]
    InvalidUrl(String),

    #[error("`{0}` would be written outside the target directory")]
    OutsideTarget(String),
}
