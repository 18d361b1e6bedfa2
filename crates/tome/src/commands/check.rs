//! `tome check` command implementation.

use std::path::PathBuf;

use clap::Args;
use tome_check::CheckError;
use tome_config::{CliSettings, Config};
use tome_site::Pipeline;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover tome.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chapters directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Revalidate every sample instead of trusting cached results.
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CheckArgs {
    /// Load the book and validate its samples without writing output.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            check_enabled: Some(true),
            cache_enabled: self.no_cache.then_some(false),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let pipeline = Pipeline::new(&config).with_cache_version(version);

        let book = pipeline.load()?;
        output.info(&format!(
            "Loaded {} chapter(s) with {} sample(s)",
            book.chapters.len(),
            book.sample_count()
        ));

        let report = match pipeline.check(&book) {
            Ok(report) => report.unwrap_or_default(),
            Err(CheckError::Failed(failures)) => {
                output.sample_failures(&failures);
                return Err(CheckError::Failed(failures).into());
            }
            Err(err) => return Err(err.into()),
        };

        output.success(&format!(
            "All samples behave as annotated: {} validated, {} cached, {} ignored",
            report.validated, report.cached, report.ignored
        ));
        Ok(())
    }
}
