// ─── File placement ───
// Destructive writes into mods directories. Every failure here is an
// extraction error: the destination may be left partially written.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::core::error::{InstallerError, InstallerResult};

/// Removes a file or directory tree if present.
pub fn delete_if_exists(path: &Path) -> InstallerResult<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(InstallerError::extraction(path, e)),
    };

    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.map_err(|e| InstallerError::extraction(path, e))
}

/// Copies the tree at `source` into `destination`, creating it.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> InstallerResult<()> {
    ensure_not_nested(source, destination)?;
    std::fs::create_dir_all(destination).map_err(|e| InstallerError::extraction(destination, e))?;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| InstallerError::extraction(source, e.into()))?;
        let rel_path = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| InstallerError::Other(format!("{:?}: {}", entry.path(), e)))?;
        let dst_path = destination.join(rel_path);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dst_path)
                .map_err(|e| InstallerError::extraction(&dst_path, e))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = dst_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InstallerError::extraction(parent, e))?;
            }
            std::fs::copy(entry.path(), &dst_path)
                .map_err(|e| InstallerError::extraction(&dst_path, e))?;
        }
    }

    Ok(())
}

/// Fails when `destination` would land inside `source`.
pub fn ensure_not_nested(source: &Path, destination: &Path) -> InstallerResult<()> {
    let Ok(source) = std::fs::canonicalize(source) else {
        return Ok(());
    };
    let parent = destination
        .parent()
        .and_then(|parent| std::fs::canonicalize(parent).ok());

    match parent {
        Some(parent) if parent.starts_with(&source) => Err(InstallerError::Other(format!(
            "cannot copy {:?} into itself at {:?}",
            source, destination
        ))),
        _ => Ok(()),
    }
}

/// `dir/name` when `name` is a single plain path segment.
pub fn child_path(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) => Some(dir.join(segment)),
        _ => None,
    }
}

/// Byte-for-byte copy that replaces whatever is at `destination`.
pub fn replace_file(source: &Path, destination: &Path) -> InstallerResult<()> {
    delete_if_exists(destination)?;
    std::fs::copy(source, destination).map_err(|e| InstallerError::extraction(destination, e))?;
    Ok(())
}

/// True when both paths resolve to the same existing file system object.
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
