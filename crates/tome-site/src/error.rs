//! Site build errors.

use std::path::PathBuf;

use tome_book::BookError;
use tome_check::CheckError;
use tome_snapshot::SnapshotError;

/// Error returned while rendering a book.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown highlight theme `{0}`")]
    UnknownTheme(String),

    #[error("rendered {actual} page(s), expected {expected}")]
    PageCount { expected: usize, actual: usize },

    #[error(transparent)]
    Book(#[from] BookError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
