//! All-or-nothing directory copies
//!
//! Used both to install from the cache and to populate it. After
//! [`copy_dir`] returns, the destination either mirrors the source or does
//! not exist, so a half-written package can never be served as a cache hit.

use crate::error::{CopyPhase, OnpmError, OnpmResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Copy the tree at `source` to `destination`.
///
/// The destination and its missing ancestors are created first; a stale
/// destination is cleared so no files from an earlier tree survive. If the
/// copy fails partway the destination is removed again. A failure to remove
/// it is reported as a [`CopyPhase::Rollback`] error.
///
/// Source and destination must not overlap: copying a tree onto itself, into
/// itself or over one of its ancestors fails in the prepare phase before
/// anything is deleted.
pub fn copy_dir(source: &Path, destination: &Path) -> OnpmResult<()> {
    debug!(
        "Preparing destination {} for copy from {}",
        destination.display(),
        source.display()
    );
    check_disjoint(source, destination)
        .map_err(|e| OnpmError::copy(CopyPhase::Prepare, destination, e))?;
    prepare_destination(destination)
        .map_err(|e| OnpmError::copy(CopyPhase::Prepare, destination, e))?;

    let Err(copy_error) = copy_dir_recursive(source, destination) else {
        debug!("Copied {} to {}", source.display(), destination.display());
        return Ok(());
    };

    debug!(
        "Copy into {} failed ({}), removing partial tree",
        destination.display(),
        copy_error
    );
    match fs::remove_dir_all(destination) {
        Ok(()) => Err(OnpmError::copy(CopyPhase::Copy, source, copy_error)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(OnpmError::copy(CopyPhase::Copy, source, copy_error))
        }
        Err(rollback_error) => {
            warn!(
                "Could not remove partial copy at {}: {} (copy error: {})",
                destination.display(),
                rollback_error,
                copy_error
            );
            Err(OnpmError::copy(
                CopyPhase::Rollback,
                destination,
                rollback_error,
            ))
        }
    }
}

/// Fail if one of the two trees contains the other
fn check_disjoint(source: &Path, destination: &Path) -> io::Result<()> {
    // A missing source fails later, in the copy phase
    let Ok(source) = source.canonicalize() else {
        return Ok(());
    };
    let destination = canonicalize_existing_prefix(destination)?;

    if destination.starts_with(&source) || source.starts_with(&destination) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "source {} and destination {} overlap",
                source.display(),
                destination.display()
            ),
        ));
    }
    Ok(())
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest
fn canonicalize_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut missing = Vec::new();
    let mut current = absolute.as_path();
    loop {
        match current.canonicalize() {
            Ok(mut resolved) => {
                for component in missing.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (current.parent(), current.file_name()) else {
                    return Ok(absolute.clone());
                };
                missing.push(name.to_os_string());
                current = parent;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Create `destination`, clearing whatever was there before
fn prepare_destination(destination: &Path) -> io::Result<()> {
    match fs::symlink_metadata(destination) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(destination)?,
        Ok(_) => fs::remove_file(destination)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(destination)
}

/// Recursively copy directories, regular files and symlinks
fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    if !dst.exists() {
        fs::create_dir(dst)?;
    }

    // Name order keeps copies reproducible
    let mut entries = fs::read_dir(src)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            // fs::copy carries permission bits over
            fs::copy(&src_path, &dst_path)?;
        } else {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported file type at {}", src_path.display()),
            ));
        }
    }

    let permissions = fs::metadata(src)?.permissions();
    fs::set_permissions(dst, permissions)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    // Without unix symlinks, copy what the link points at
    if src.is_dir() {
        copy_dir_recursive(src, dst)
    } else {
        fs::copy(src, dst).map(|_| ())
    }
}
