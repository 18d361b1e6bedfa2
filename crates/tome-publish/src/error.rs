//! Publishing errors.

use std::path::PathBuf;

use tome_snapshot::SnapshotError;

/// Error returned by publishers and the trigger guard.
///
/// Nothing is retried; every variant aborts the publish with the
/// destination unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("{}: nothing to publish", .0.display())]
    EmptySite(PathBuf),

    #[error("{} was built from other sources; run `tome build` first", .0.display())]
    StaleBuild(PathBuf),

    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("refusing to publish from `{git_ref}`: only `{trunk}` is published")]
    NotTrunk { git_ref: String, trunk: String },

    #[error("refusing to publish from a pull request ({event} event)")]
    PullRequest { event: String },

    #[error("git {step} failed: {message}")]
    Git { step: &'static str, message: String },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublishError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
