//! Recursive removal that copes with read-only entries and symlinks
//!
//! Generated build trees often contain read-only files (copied headers,
//! packed git objects in fetched dependencies). Symlinks are unlinked as a
//! single entry and never followed.

use std::fs;
use std::io;
use std::path::Path;

use crate::common::{Error, Result};

/// Delete `path` and everything below it
///
/// A path that does not exist is treated as already removed.
pub fn remove_tree(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(remove_error(path, e)),
    };

    if meta.file_type().is_symlink() {
        return remove_link(path);
    }

    if meta.is_dir() {
        if meta.permissions().readonly() {
            make_writable(path, &meta).map_err(|e| remove_error(path, e))?;
        }
        for entry in fs::read_dir(path).map_err(|e| remove_error(path, e))? {
            let entry = entry.map_err(|e| remove_error(path, e))?;
            remove_tree(&entry.path())?;
        }
        retry_writable(path, &meta, |p| fs::remove_dir(p))
    } else {
        retry_writable(path, &meta, |p| fs::remove_file(p))
    }
}

/// Run `op`, and if it is refused, clear the read-only bit and run it again
fn retry_writable(path: &Path, meta: &fs::Metadata, op: fn(&Path) -> io::Result<()>) -> Result<()> {
    match op(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            tracing::trace!(path = %path.display(), "Clearing read-only attribute");
            make_writable(path, meta).map_err(|e| remove_error(path, e))?;
            op(path).map_err(|e| remove_error(path, e))
        }
        Err(e) => Err(remove_error(path, e)),
    }
}

fn remove_link(path: &Path) -> Result<()> {
    // Directory symlinks on Windows are directory entries and need remove_dir.
    fs::remove_file(path)
        .or_else(|_| fs::remove_dir(path))
        .map_err(|e| remove_error(path, e))
}

#[cfg(unix)]
fn make_writable(path: &Path, meta: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode();
    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o700))
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path, meta: &fs::Metadata) -> io::Result<()> {
    let mut perms = meta.permissions();
    perms.set_readonly(false);
    fs::set_permissions(path, perms)
}

fn remove_error(path: &Path, source: io::Error) -> Error {
    Error::Remove {
        path: path.to_path_buf(),
        source,
    }
}
