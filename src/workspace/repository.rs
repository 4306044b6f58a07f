//! Companion repository checkout
//!
//! The fixtures consume the helper library from a local clone. Before a run
//! the clone is created if missing, or fast-forwarded if present.

use std::fs;
use std::io;
use std::path::Path;

use crate::common::{Error, Result};
use crate::process::{CommandRunner, Invocation};

/// What [`ensure_repository`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryAction {
    Cloned,
    Updated,
}

/// Clone `url` into `path` if absent, otherwise pull inside `path`
///
/// A non-directory at `path` is a fatal precondition failure.
pub async fn ensure_repository(
    runner: &dyn CommandRunner,
    git: &str,
    url: &str,
    path: &Path,
) -> Result<RepositoryAction> {
    // Any entry at `path` counts as present, dangling symlinks included.
    match fs::symlink_metadata(path) {
        Ok(_) if path.is_dir() => {
            tracing::info!(path = %path.display(), "Updating repository");
            runner.run(&Invocation::new(git, path).arg("pull")).await?;
            return Ok(RepositoryAction::Updated);
        }
        Ok(_) => return Err(Error::RepositoryNotDirectory(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!(url, path = %path.display(), "Cloning repository");
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let target = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::Config(format!("Invalid repository path '{}'", path.display()))
        })?;

    runner
        .run(&Invocation::new(git, parent).args(["clone", url, target.as_str()]))
        .await?;
    Ok(RepositoryAction::Cloned)
}
