//! Listing, copying, hashing and swapping document sets.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::SnapshotError;

/// Files of a document set, as sorted `/`-separated relative paths.
///
/// Hidden entries at the root (`.git`, the build manifest, staging
/// leftovers) are skipped. Symlinks are never descended into: a link to a
/// directory is skipped, any other link is listed as a file.
pub fn list_files(root: &Path) -> Result<Vec<String>, SnapshotError> {
    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<String>) -> Result<(), SnapshotError> {
    let entries = fs::read_dir(dir).map_err(SnapshotError::io(dir))?;
    for entry in entries {
        let entry = entry.map_err(SnapshotError::io(dir))?;
        let path = entry.path();
        if dir == root && entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(SnapshotError::io(&path))?;
        if file_type.is_dir() {
            walk(root, &path, files)?;
            continue;
        }
        if file_type.is_symlink() && path.metadata().is_ok_and(|meta| meta.is_dir()) {
            tracing::warn!(path = %path.display(), "Skipping symlinked directory");
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        files.push(relative.to_string_lossy().replace('\\', "/"));
    }
    Ok(())
}

/// Copy the document set at `from` into the existing directory `to`.
///
/// Returns the number of files copied.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, SnapshotError> {
    let files = list_files(from)?;
    for file in &files {
        let source = from.join(file);
        let target = to.join(file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(SnapshotError::io(parent))?;
        }
        fs::copy(&source, &target).map_err(SnapshotError::io(&source))?;
    }
    Ok(files.len())
}

/// SHA-256 over every file path and content, in path order.
///
/// Two directories with the same digest hold byte-identical document sets.
pub fn snapshot_digest(root: &Path) -> Result<String, SnapshotError> {
    digest_files(root, &list_files(root)?)
}

pub(crate) fn digest_files(root: &Path, files: &[String]) -> Result<String, SnapshotError> {
    let mut hasher = Sha256::new();
    for file in files {
        let path = root.join(file);
        let content = fs::read(&path).map_err(SnapshotError::io(&path))?;
        hasher.update(file.as_bytes());
        hasher.update([0]);
        hasher.update((content.len() as u64).to_le_bytes());
        hasher.update(&content);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Sibling path of `target` named `.{name}.{suffix}`.
pub fn sibling(target: &Path, suffix: &str) -> Result<PathBuf, SnapshotError> {
    let absolute = std::path::absolute(target).map_err(SnapshotError::io(target))?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => {
            Ok(parent.join(format!(".{}.{suffix}", name.to_string_lossy())))
        }
        _ => Err(SnapshotError::InvalidTarget(target.to_path_buf())),
    }
}

/// Replace `target` with `staging` using two renames.
///
/// `staging` is discarded and the old `target` restored when either rename
/// fails, so `target` is always the old set or the new one.
pub fn swap_into_place(staging: &Path, target: &Path, backup: &Path) -> Result<(), SnapshotError> {
    if let Err(err) = remove_dir_if_exists(backup) {
        discard(staging);
        return Err(err);
    }

    let had_target = target.exists();
    if had_target && let Err(source) = fs::rename(target, backup) {
        discard(staging);
        return Err(SnapshotError::Io {
            path: target.to_path_buf(),
            source,
        });
    }
    if let Err(source) = fs::rename(staging, target) {
        if had_target {
            let _ = fs::rename(backup, target);
        }
        discard(staging);
        return Err(SnapshotError::Io {
            path: target.to_path_buf(),
            source,
        });
    }
    if had_target && let Err(err) = fs::remove_dir_all(backup) {
        tracing::warn!(path = %backup.display(), error = %err, "Failed to remove previous snapshot");
    }
    Ok(())
}

pub fn remove_dir_if_exists(path: &Path) -> Result<(), SnapshotError> {
    match fs::remove_dir_all(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(SnapshotError::Io {
            path: path.to_path_buf(),
            source: err,
        }),
        _ => Ok(()),
    }
}

/// Best-effort removal of a staging directory.
pub fn discard(path: &Path) {
    if let Err(err) = fs::remove_dir_all(path)
        && err.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %err, "Failed to remove staging directory");
    }
}

/// Current UTC time as RFC 3339, without fractional seconds.
pub fn timestamp() -> String {
    use time::format_description::well_known::Rfc3339;

    let now = time::OffsetDateTime::now_utc();
    let now = now.replace_nanosecond(0).unwrap_or(now);
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
