//! The record a build leaves next to its pages.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::tree::{digest_files, list_files, timestamp};

/// File name of the manifest, at the root of the rendered set.
pub const MANIFEST_FILE: &str = ".tome-build.json";

/// What a completed build wrote.
///
/// `files` and `digest` cover the rendered set without the manifest itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// HTML pages, the index included.
    pub pages: usize,
    pub files: usize,
    /// [`snapshot_digest`](crate::snapshot_digest) of the rendered set.
    pub digest: String,
    /// Digest of the chapter sources the set was rendered from.
    pub source_digest: String,
    /// RFC 3339 UTC.
    pub built_at: String,
}

impl BuildManifest {
    /// Describe the set already written at `root`.
    pub fn for_site(
        root: &Path,
        pages: usize,
        source_digest: impl Into<String>,
    ) -> Result<Self, SnapshotError> {
        let files = list_files(root)?;
        Ok(Self {
            pages,
            files: files.len(),
            digest: digest_files(root, &files)?,
            source_digest: source_digest.into(),
            built_at: timestamp(),
        })
    }

    pub fn write(&self, root: &Path) -> Result<(), SnapshotError> {
        let path = root.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            SnapshotError::InvalidManifest {
                path: path.clone(),
                message: err.to_string(),
            }
        })?;
        fs::write(&path, json + "\n").map_err(SnapshotError::io(&path))
    }

    pub fn read(root: &Path) -> Result<Self, SnapshotError> {
        let path = root.join(MANIFEST_FILE);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnapshotError::MissingManifest(root.to_path_buf()));
            }
            Err(source) => return Err(SnapshotError::Io { path, source }),
        };
        serde_json::from_str(&json).map_err(|err| SnapshotError::InvalidManifest {
            path,
            message: err.to_string(),
        })
    }

    /// Read the manifest at `root` and check the set still matches it.
    ///
    /// Fails with [`SnapshotError::Modified`] when pages were added or
    /// removed, or when any file changed since the build.
    pub fn verify(root: &Path) -> Result<Self, SnapshotError> {
        let manifest = Self::read(root)?;
        let files = list_files(root)?;
        let modified = |message: String| SnapshotError::Modified {
            path: root.to_path_buf(),
            message,
        };

        let pages = files.iter().filter(|file| file.ends_with(".html")).count();
        if pages != manifest.pages {
            return Err(modified(format!(
                "{pages} page(s) on disk, the build wrote {}",
                manifest.pages
            )));
        }
        if files.len() != manifest.files {
            return Err(modified(format!(
                "{} file(s) on disk, the build wrote {}",
                files.len(),
                manifest.files
            )));
        }
        if digest_files(root, &files)? != manifest.digest {
            return Err(modified("file contents differ from the build".to_owned()));
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("assets")).unwrap();
        fs::write(tmp.path().join("index.html"), "<h1>Book</h1>").unwrap();
        fs::write(tmp.path().join("01-intro.html"), "<h1>Intro</h1>").unwrap();
        fs::write(tmp.path().join("assets/book.css"), "body {}").unwrap();
        BuildManifest::for_site(tmp.path(), 2, "abc")
            .unwrap()
            .write(tmp.path())
            .unwrap();
        tmp
    }

    #[test]
    fn test_written_manifest_verifies() {
        let tmp = site();
        let manifest = BuildManifest::verify(tmp.path()).unwrap();
        assert_eq!(manifest.pages, 2);
        assert_eq!(manifest.files, 3);
        assert_eq!(manifest.source_digest, "abc");
        assert_eq!(manifest, BuildManifest::read(tmp.path()).unwrap());
    }

    #[test]
    fn test_missing_manifest() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "hand made").unwrap();

        let err = BuildManifest::verify(tmp.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingManifest(_)));
    }

    #[test]
    fn test_corrupt_manifest() {
        let tmp = site();
        fs::write(tmp.path().join(MANIFEST_FILE), "not json").unwrap();

        let err = BuildManifest::read(tmp.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidManifest { .. }));
    }

    #[test]
    fn test_removed_page_is_detected() {
        let tmp = site();
        fs::remove_file(tmp.path().join("01-intro.html")).unwrap();

        let err = BuildManifest::verify(tmp.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "{} changed after it was built: 1 page(s) on disk, the build wrote 2",
                tmp.path().display()
            )
        );
    }

    #[test]
    fn test_edited_file_is_detected() {
        let tmp = site();
        fs::write(tmp.path().join("assets/book.css"), "body { color: red }").unwrap();

        let err = BuildManifest::verify(tmp.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::Modified { .. }));
    }

    #[test]
    fn test_extra_asset_is_detected() {
        let tmp = site();
        fs::write(tmp.path().join("assets/extra.js"), "").unwrap();

        let err = BuildManifest::verify(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("4 file(s) on disk, the build wrote 3"));
    }
}
