//! Scoped library search-path augmentation
//!
//! On Windows the DLLs produced by a fixture's build are not on the loader
//! path, so ctest cannot start the test executables. The build writes the
//! directories it needs into a path-list file; while tests run, its first
//! line is prepended to the search-path variable.
//!
//! The variable is process-global. [`SearchPathGuard`] restores the exact
//! previous value when dropped, whether the wrapped phase returned, failed or
//! panicked.

use std::env;
use std::ffi::OsString;
use std::future::Future;
use std::path::Path;

use super::options::SearchPathSpec;
use crate::common::{Error, Result};

/// Holds the previous value of an augmented variable until dropped
#[derive(Debug)]
pub struct SearchPathGuard {
    var: String,
    previous: Option<OsString>,
}

impl SearchPathGuard {
    /// Prepend the first line of the path-list file under `build_dir`
    pub fn acquire(spec: &SearchPathSpec, build_dir: &Path) -> Result<Self> {
        let entry = read_first_path(&build_dir.join(&spec.path_list_file))?;
        Ok(Self::prepend(&spec.var, spec.separator, &entry))
    }

    /// Prepend `entry` to `var`, returning the guard that undoes it
    pub fn prepend(var: &str, separator: &str, entry: &str) -> Self {
        let previous = env::var_os(var);

        let mut value = OsString::from(entry);
        if let Some(old) = previous.as_ref().filter(|old| !old.is_empty()) {
            value.push(separator);
            value.push(old);
        }

        tracing::debug!(var, entry, "Augmenting search path");
        env::set_var(var, &value);

        Self {
            var: var.to_string(),
            previous,
        }
    }
}

impl Drop for SearchPathGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => env::set_var(&self.var, value),
            None => env::remove_var(&self.var),
        }
        tracing::debug!(var = %self.var, "Restored search path");
    }
}

/// Run `phase` with the search path augmented according to `spec`
///
/// With no spec the phase runs unchanged. The guard lives across the await,
/// so the variable is restored on every exit path.
pub async fn with_search_path<F, T>(
    spec: Option<&SearchPathSpec>,
    build_dir: &Path,
    phase: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let _guard = match spec {
        Some(spec) => Some(SearchPathGuard::acquire(spec, build_dir)?),
        None => None,
    };
    phase.await
}

fn read_first_path(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::PathList {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    content
        .lines()
        .next()
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::PathList {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        })
}
