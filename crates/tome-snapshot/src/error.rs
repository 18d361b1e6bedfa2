//! Snapshot errors.

use std::path::PathBuf;

/// Error returned while reading, writing or swapping a document set.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} has no usable directory name", .0.display())]
    InvalidTarget(PathBuf),

    #[error("{} was not produced by `tome build` (no build manifest)", .0.display())]
    MissingManifest(PathBuf),

    #[error("unreadable build manifest at {}: {message}", path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("{} changed after it was built: {message}", path.display())]
    Modified { path: PathBuf, message: String },
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
