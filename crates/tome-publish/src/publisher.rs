//! The publishing seam.

use std::path::Path;

use tome_snapshot::{BuildManifest, list_files};

use crate::credential::Credential;
use crate::error::PublishError;

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Where the snapshot went, with any credential removed.
    pub destination: String,
    /// Files in the snapshot.
    pub files: usize,
    /// Content digest of the snapshot; equal input gives an equal digest.
    pub digest: String,
    /// Commit id, for git destinations.
    pub revision: Option<String>,
    /// RFC 3339 UTC time of the publish.
    pub published_at: String,
}

/// Replaces the single current snapshot at a destination.
///
/// Implementations either fully replace the destination or leave it as it
/// was; there is no partial publish.
pub trait Publisher {
    fn publish(
        &self,
        directory: &Path,
        credential: &Credential,
    ) -> Result<PublishReport, PublishError>;
}

/// Reject anything but an unmodified, complete build before touching the
/// destination.
pub(crate) fn require_site(directory: &Path) -> Result<BuildManifest, PublishError> {
    if !directory.is_dir() {
        return Err(PublishError::DirectoryNotFound(directory.to_path_buf()));
    }
    if list_files(directory)?.is_empty() {
        return Err(PublishError::EmptySite(directory.to_path_buf()));
    }
    Ok(BuildManifest::verify(directory)?)
}

/// Check that `directory` is a complete build of the sources whose
/// `Book::digest` is `source_digest`.
pub fn require_current(directory: &Path, source_digest: &str) -> Result<(), PublishError> {
    let manifest = require_site(directory)?;
    if manifest.source_digest != source_digest {
        tracing::debug!(
            built = %manifest.source_digest,
            current = %source_digest,
            "Sources changed since build"
        );
        return Err(PublishError::StaleBuild(directory.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::built_site;
    use std::fs;
    use tempfile::TempDir;
    use tome_snapshot::SnapshotError;

    #[test]
    fn test_require_site() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        assert!(matches!(
            require_site(&missing),
            Err(PublishError::DirectoryNotFound(_))
        ));
        assert!(matches!(
            require_site(tmp.path()),
            Err(PublishError::EmptySite(_))
        ));

        let site = built_site(tmp.path(), "book", &[("index.html", "")]);
        assert_eq!(require_site(&site).unwrap().pages, 1);
    }

    #[test]
    fn test_hand_made_directory_is_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "<p>hand made</p>").unwrap();

        let err = require_site(tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            PublishError::Snapshot(SnapshotError::MissingManifest(_))
        ));
    }

    #[test]
    fn test_directory_edited_after_build_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let site = built_site(tmp.path(), "book", &[("index.html", ""), ("01-a.html", "")]);
        fs::remove_file(site.join("01-a.html")).unwrap();

        let err = require_site(&site).unwrap_err();
        assert!(matches!(
            err,
            PublishError::Snapshot(SnapshotError::Modified { .. })
        ));
    }

    #[test]
    fn test_require_current_compares_sources() {
        let tmp = TempDir::new().unwrap();
        let site = built_site(tmp.path(), "book", &[("index.html", "")]);

        require_current(&site, crate::testing::SOURCE_DIGEST).unwrap();
        assert!(matches!(
            require_current(&site, "other"),
            Err(PublishError::StaleBuild(_))
        ));
    }
}
