/// Recursive output directory creation

use devbuild_host::{FileSystem, PathOps};

use crate::error::Result;

/// What `ensure_dir` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Created,
    AlreadyExisted,
}

/// Make sure `path` exists as a directory, creating missing ancestors first.
///
/// A creation attempt that loses a race against another creator counts as
/// `AlreadyExisted`. Any other failure is returned as
/// [`BuildError::DirectoryCreate`](crate::BuildError::DirectoryCreate).
pub fn ensure_dir(fs: &dyn FileSystem, paths: &dyn PathOps, path: &str) -> Result<Materialized> {
    if fs.exists(path) {
        return Ok(Materialized::AlreadyExisted);
    }

    let parent = paths.dirname(path);
    if parent != path && !parent.is_empty() {
        ensure_dir(fs, paths, &parent)?;
    }

    match fs.make_directory(path) {
        Ok(()) => {
            tracing::debug!(dir = path, "created directory");
            Ok(Materialized::Created)
        }
        Err(e) if e.is_already_exists() => Ok(Materialized::AlreadyExisted),
        Err(e) => Err(e.into()),
    }
}
