//! File-system helpers shared by resources and the backup engine.
use std::io;
use std::path::Path;

/// Create every missing directory above `path`.
///
/// # Errors
///
/// Propagates the `create_dir_all` failure.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Copy the tree under `src` to `dst`, following symlinks inside it.
///
/// # Errors
///
/// Stops at the first directory, read or copy failure.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

/// Move `from` to `to`, which must not exist yet.
///
/// Uses `rename`; when source and destination sit on different filesystems
/// the entry is copied and the original removed.
///
/// # Errors
///
/// [`io::ErrorKind::AlreadyExists`] when `to` is taken, otherwise the rename
/// error or any error from the copy fallback.
pub fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    if to.symlink_metadata().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }
    match std::fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to),
        other => other,
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(from)?;
    if meta.file_type().is_symlink() {
        let target = std::fs::read_link(from)?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, to)?;
        #[cfg(not(unix))]
        std::fs::copy(from, to).map(|_| ())?;
        std::fs::remove_file(from)
    } else if meta.is_dir() {
        copy_dir_recursive(from, to)?;
        std::fs::remove_dir_all(from)
    } else {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)
    }
}
