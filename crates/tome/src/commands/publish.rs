//! `tome publish` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use tome_config::{CliSettings, Config};
use tome_publish::{
    Credential, DirectoryPublisher, GitPublisher, PublishGuard, Publisher, TriggerContext,
    TriggerFlags, require_current,
};
use tome_site::Pipeline;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Path to configuration file (default: auto-discover tome.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rendered book to publish (default: the configured build directory).
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Git remote receiving the snapshot (overrides config).
    #[arg(long)]
    remote: Option<String>,

    /// Branch overwritten by the snapshot (overrides config).
    #[arg(long)]
    branch: Option<String>,

    /// Branch this run was triggered from (default: CI environment, then git).
    #[arg(long = "ref", value_name = "REF")]
    git_ref: Option<String>,

    /// CI event that triggered this run (default: `GITHUB_EVENT_NAME`).
    #[arg(long)]
    event: Option<String>,

    /// Publish into a local directory instead of a git remote.
    #[arg(long, conflicts_with_all = ["remote", "branch"])]
    target_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl PublishArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            remote: self.remote,
            branch: self.branch,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let publish = &config.publish;

        let context = TriggerContext::resolve(TriggerFlags {
            event: self.event,
            git_ref: self.git_ref,
        });
        PublishGuard::new(publish.trunk.clone()).check(&context)?;

        let directory = self
            .directory
            .unwrap_or_else(|| config.book_resolved.build_dir.clone());
        require_fresh(&config, &directory)?;

        let (publisher, credential): (Box<dyn Publisher>, Credential) = match self.target_dir {
            Some(target) => {
                output.info(&format!(
                    "Publishing {} to {}",
                    directory.display(),
                    target.display()
                ));
                (Box::new(DirectoryPublisher::new(target)), Credential::new(""))
            }
            None => {
                let publisher = GitPublisher::from_config(publish)?;
                let credential = Credential::from_env(&publish.token_env)?;
                output.info(&format!(
                    "Publishing {} to {} ({})",
                    directory.display(),
                    credential.redact(publish.require_remote()?),
                    publish.branch
                ));
                (Box::new(publisher), credential)
            }
        };

        let report = publisher.publish(&directory, &credential)?;

        let revision = report
            .revision
            .map(|rev| format!(" at {rev}"))
            .unwrap_or_default();
        output.success(&format!(
            "Published {} file(s) to {}{revision} ({})",
            report.files, report.destination, report.published_at
        ));
        Ok(())
    }
}

/// The rendered set must come from a full build of the sources as they are now.
fn require_fresh(config: &Config, directory: &Path) -> Result<(), CliError> {
    let book = Pipeline::new(config).load()?;
    require_current(directory, &book.digest())?;
    tracing::debug!(directory = %directory.display(), "Build matches current sources");
    Ok(())
}
