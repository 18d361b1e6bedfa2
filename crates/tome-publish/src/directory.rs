//! Publishing to a local directory, e.g. a web server's document root.

use std::fs;
use std::path::{Path, PathBuf};

use tome_snapshot::{
    copy_tree, discard, remove_dir_if_exists, sibling, snapshot_digest, swap_into_place,
    timestamp,
};

use crate::credential::Credential;
use crate::error::PublishError;
use crate::publisher::{PublishReport, Publisher, require_site};

/// Replaces a directory with a full copy of the document set.
///
/// The copy is staged next to the target and swapped in with renames, so
/// a failure during staging leaves the target as it was.
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
    target: PathBuf,
}

impl DirectoryPublisher {
    #[must_use]
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl Publisher for DirectoryPublisher {
    /// Local targets need no credential; it is accepted for a uniform seam.
    fn publish(
        &self,
        directory: &Path,
        _credential: &Credential,
    ) -> Result<PublishReport, PublishError> {
        require_site(directory)?;

        let staging = sibling(&self.target, "publish-staging")?;
        let backup = sibling(&self.target, "publish-previous")?;
        if let Some(parent) = staging.parent() {
            fs::create_dir_all(parent).map_err(PublishError::io(parent))?;
        }
        remove_dir_if_exists(&staging)?;
        fs::create_dir(&staging).map_err(PublishError::io(&staging))?;

        let staged = copy_tree(directory, &staging).and_then(|files| {
            let digest = snapshot_digest(&staging)?;
            Ok((files, digest))
        });
        let (files, digest) = match staged {
            Ok(staged) => staged,
            Err(err) => {
                discard(&staging);
                return Err(err.into());
            }
        };

        swap_into_place(&staging, &self.target, &backup)?;
        tracing::info!(path = %self.target.display(), files, "Published snapshot");

        Ok(PublishReport {
            destination: self.target.display().to_string(),
            files,
            digest,
            revision: None,
            published_at: timestamp(),
        })
    }
}
