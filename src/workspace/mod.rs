//! Fixture workspaces
//!
//! Every fixture is a directory holding a `CMakeLists.txt`. The harness owns
//! two subdirectories inside it: `build` (the cmake binary dir) and
//! `external` (where live dependencies are fetched). Both are wiped before a
//! run and left in place afterwards for inspection.

mod remove;
pub mod repository;

pub use remove::remove_tree;
pub use repository::{ensure_repository, RepositoryAction};

use std::io;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Name of the build directory inside a fixture
pub const BUILD_DIR: &str = "build";

/// Name of the live-dependency directory inside a fixture
pub const EXTERNAL_DIR: &str = "external";

/// Paths belonging to one fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureWorkspace {
    name: String,
    source_dir: PathBuf,
    build_dir: PathBuf,
    external_dir: PathBuf,
}

impl FixtureWorkspace {
    /// Derive the workspace of fixture `name` under `base`
    pub fn new(base: &Path, name: &str) -> Self {
        let source_dir = base.join(name);
        Self {
            name: name.to_string(),
            build_dir: source_dir.join(BUILD_DIR),
            external_dir: source_dir.join(EXTERNAL_DIR),
            source_dir,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn external_dir(&self) -> &Path {
        &self.external_dir
    }

    /// Whether the fixture's source directory exists
    pub fn exists(&self) -> bool {
        self.source_dir.is_dir()
    }

    /// Remove the build and external directories
    pub fn clean(&self) -> Result<()> {
        tracing::debug!(fixture = %self.name, "Cleaning workspace");
        remove_tree(&self.build_dir)?;
        remove_tree(&self.external_dir)
    }

    /// Remove only the build directory
    pub fn remove_build_dir(&self) -> Result<()> {
        remove_tree(&self.build_dir)
    }

    /// Create the build directory, failing if anything is already there
    pub fn create_build_dir(&self) -> Result<()> {
        std::fs::create_dir(&self.build_dir).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                Error::BuildDirExists(self.build_dir.clone())
            } else {
                Error::Io(e)
            }
        })
    }
}
