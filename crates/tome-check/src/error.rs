//! Sample validation errors.

use std::fmt;
use std::path::PathBuf;

use tome_book::Directive;

/// A toolchain could not be invoked at all.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error in sample workspace {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("empty command template")]
    EmptyCommand,
}

/// One sample that did not behave as its directive requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFailure {
    /// Chapter path relative to the source directory.
    pub chapter: PathBuf,
    /// Zero-based index of the sample within the chapter.
    pub index: usize,
    /// Line of the opening fence.
    pub line: usize,
    pub language: String,
    pub directive: Directive,
    /// Short description of what went wrong.
    pub reason: String,
    /// Captured toolchain diagnostics.
    pub stderr: String,
}

impl fmt::Display for SampleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: sample #{} ({}, {}): {}",
            self.chapter.display(),
            self.line,
            self.index + 1,
            self.language,
            self.directive,
            self.reason
        )
    }
}

/// Error returned by [`Checker::check`](crate::Checker::check).
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("{} code sample(s) failed validation", .0.len())]
    Failed(Vec<SampleFailure>),

    #[error("{language} toolchain unavailable: {source}")]
    Toolchain {
        language: String,
        #[source]
        source: ToolchainError,
    },
}
