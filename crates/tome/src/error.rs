//! CLI error types.

use tome_book::BookError;
use tome_check::CheckError;
use tome_config::ConfigError;
use tome_publish::PublishError;
use tome_site::BuildError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Book(#[from] BookError),

    #[error("{0}")]
    Check(#[from] CheckError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Publish(#[from] PublishError),
}
