use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Name of the sample application under `fixtures/`.
pub const SAMPLE_APP: &str = "sample-app";

/// A fixture application copied into a temporary directory, so tests can
/// change it freely.
//
// example usage:
// ```rust,ignore
// let app = FixtureApp::sample();
// let config = ApidocConfig::load(&app.config_path()).unwrap();
// let apidoc = config.build().unwrap();
// ```
pub struct FixtureApp {
    dir: TempDir,
}

impl FixtureApp {
    pub fn new(fixture_dir_name: &str) -> Result<Self> {
        let dir = TempDir::new().context("Failed to create temp directory")?;
        let source = fixtures_path().join(fixture_dir_name);
        copy_dir_all(&source, dir.path())
            .with_context(|| format!("Failed to copy fixture {}", source.display()))?;
        debug!("Copied fixture {fixture_dir_name} to {}", dir.path().display());
        Ok(Self { dir })
    }

    /// The shop application: packages, meta and regular configuration
    /// files and a registration manifest.
    pub fn sample() -> Self {
        Self::new(SAMPLE_APP).expect("Failed to set up the sample application")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("apidoc.toml")
    }

    /// Directory holding the application packages.
    pub fn source_path(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    /// Write a file relative to the application root, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }
}

/// The `fixtures/` directory at the root of the workspace.
pub fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
}

pub fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)?;
    }

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_all(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}
