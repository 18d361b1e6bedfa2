//! Book loading errors.

use std::path::PathBuf;

/// Error returned while loading chapters.
///
/// Every content variant names the offending chapter file.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid front matter: {message}", path.display())]
    InvalidFrontMatter { path: PathBuf, message: String },

    #[error(
        "{}: no ordinal position (add `position:` front matter or a numeric filename prefix)",
        .0.display()
    )]
    MissingPosition(PathBuf),

    #[error("{}: malformed ordinal position `{value}`", path.display())]
    MalformedPosition { path: PathBuf, value: String },

    #[error(
        "duplicate ordinal position {position}: {} and {}",
        first.display(),
        second.display()
    )]
    DuplicatePosition {
        position: u32,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{}: file name is reserved for the generated index page", .0.display())]
    ReservedName(PathBuf),
}
