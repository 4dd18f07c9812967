use crate::errors::ParseError;
use crate::introspector::Introspector;
use crate::utilities::DocFormat;
use crate::zcml::{Directive, parse_file};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        debug!("Cannot read {}: {e}", path.display());
        String::new()
    })
}

/// A documentation text file shipped in a package.
pub struct TextFileNode {
    path: PathBuf,
}

impl TextFileNode {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> String {
        read(&self.path)
    }

    pub fn format(&self) -> DocFormat {
        DocFormat::for_file(&self.path)
    }
}

/// A configuration file shipped in a package.
///
/// The file is parsed the first time its directives are asked for; the
/// result, an error included, is kept for the lifetime of the node.
pub struct ZcmlFileNode {
    intro: Arc<Introspector>,
    path: PathBuf,
    package: String,
    parsed: OnceLock<Result<Arc<Directive>, ParseError>>,
}

impl ZcmlFileNode {
    pub fn new(intro: Arc<Introspector>, path: PathBuf, package: impl Into<String>) -> Self {
        Self {
            intro,
            path,
            package: package.into(),
            parsed: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The package the file belongs to.
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn content(&self) -> String {
        read(&self.path)
    }

    pub fn parse(&self) -> Result<Arc<Directive>, ParseError> {
        self.parsed
            .get_or_init(|| {
                parse_file(&self.path, self.intro.context(), Some(&self.package))
                    .map(Arc::new)
                    .inspect_err(|e| warn!("Cannot parse configuration file: {e}"))
            })
            .clone()
    }
}
