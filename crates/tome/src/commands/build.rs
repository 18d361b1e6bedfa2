//! `tome build` command implementation.

use std::path::PathBuf;

use clap::Args;
use tome_check::CheckError;
use tome_config::{CliSettings, Config};
use tome_site::{BuildError, Pipeline};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover tome.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chapters directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for the rendered book (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip code sample validation.
    #[arg(long)]
    no_check: bool,

    /// Revalidate every sample instead of trusting cached results.
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            build_dir: self.output_dir,
            check_enabled: self.no_check.then_some(false),
            cache_enabled: self.no_cache.then_some(false),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Source: {}",
            config.book_resolved.source_dir.display()
        ));
        output.info(&format!(
            "Output: {}",
            config.book_resolved.build_dir.display()
        ));

        let report = match Pipeline::new(&config).with_cache_version(version).render() {
            Ok(report) => report,
            Err(BuildError::Check(CheckError::Failed(failures))) => {
                output.sample_failures(&failures);
                return Err(CheckError::Failed(failures).into());
            }
            Err(err) => return Err(err.into()),
        };

        for warning in &report.warnings {
            output.warning(warning);
        }
        if let Some(check) = report.check {
            output.info(&format!(
                "Checked {} sample(s): {} validated, {} cached, {} ignored",
                check.validated + check.cached + check.ignored,
                check.validated,
                check.cached,
                check.ignored
            ));
        }
        output.success(&format!(
            "Built {} page(s) from {} chapter(s) to {}",
            report.pages,
            report.chapters,
            report.output_dir.display()
        ));
        Ok(())
    }
}
