//! Tome CLI - book builder.
//!
//! Provides commands for:
//! - `build`: Render the book, validating code samples
//! - `check`: Validate code samples without rendering
//! - `publish`: Force-publish the rendered book as the current snapshot

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use commands::{BuildArgs, CheckArgs, PublishArgs};
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tome - build and publish books with tested code samples.
#[derive(Parser)]
#[command(name = "tome", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the book into a static site.
    Build(BuildArgs),
    /// Validate code samples without writing output.
    Check(CheckArgs),
    /// Publish the rendered book.
    Publish(PublishArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Build(args) => args.verbose,
            Self::Check(args) => args.verbose,
            Self::Publish(args) => args.verbose,
        }
    }
}

/// `RUST_LOG` when set, otherwise warnings and errors only.
fn quiet_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        quiet_filter()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(VERSION),
        Commands::Check(args) => args.execute(VERSION),
        Commands::Publish(args) => args.execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_quiet_filter_defaults_to_warn() {
        // Holds as long as RUST_LOG is not set for the test run.
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(quiet_filter().max_level_hint(), Some(LevelFilter::WARN));
        }
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from([
            "tome",
            "build",
            "--source-dir",
            "chapters",
            "--no-check",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.command.verbose());
        assert!(matches!(cli.command, Commands::Build(_)));
    }

    #[test]
    fn test_parse_publish_ref_and_event() {
        let cli = Cli::try_parse_from([
            "tome", "publish", "--ref", "main", "--event", "push", "--directory", "book",
        ])
        .unwrap();
        assert!(!cli.command.verbose());
        assert!(matches!(cli.command, Commands::Publish(_)));
    }

    #[test]
    fn test_target_dir_conflicts_with_remote() {
        let result = Cli::try_parse_from([
            "tome",
            "publish",
            "--target-dir",
            "/srv/www",
            "--remote",
            "https://github.com/acme/book.git",
        ]);
        assert!(result.is_err());
    }
}
