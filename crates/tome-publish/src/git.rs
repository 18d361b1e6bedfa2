//! Force-push publishing to a git branch.
//!
//! Each publish builds a fresh repository holding a single parentless
//! commit of the document set and force-pushes it over the target branch.
//! The push is one ref update, so the remote either moves to the new
//! snapshot or keeps the old one; the branch never accumulates history.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tome_config::{ConfigError, PublishConfig};
use tome_snapshot::{copy_tree, snapshot_digest, timestamp};

use crate::credential::Credential;
use crate::error::PublishError;
use crate::publisher::{PublishReport, Publisher, require_site};

/// Publishes to `refs/heads/<branch>` of a git remote.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    remote: String,
    branch: String,
    committer_name: String,
    committer_email: String,
    cname: Option<String>,
}

impl GitPublisher {
    #[must_use]
    pub fn new(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            branch: branch.into(),
            committer_name: "tome".to_owned(),
            committer_email: "tome@localhost".to_owned(),
            cname: None,
        }
    }

    /// Publisher for the `[publish]` section; fails when no remote is set.
    pub fn from_config(config: &PublishConfig) -> Result<Self, ConfigError> {
        let remote = config.require_remote()?;
        Ok(Self::new(remote, config.branch.clone())
            .with_committer(config.committer_name.clone(), config.committer_email.clone())
            .with_cname(config.cname.clone()))
    }

    #[must_use]
    pub fn with_committer(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.committer_name = name.into();
        self.committer_email = email.into();
        self
    }

    /// Custom domain written to `CNAME` at the snapshot root.
    #[must_use]
    pub fn with_cname(mut self, cname: Option<String>) -> Self {
        self.cname = cname.filter(|c| !c.trim().is_empty());
        self
    }

    fn git<'a>(
        &self,
        dir: &Path,
        step: &'static str,
        args: impl IntoIterator<Item = &'a str>,
        credential: &Credential,
    ) -> Result<String, PublishError> {
        let args: Vec<&str> = args.into_iter().collect();
        tracing::debug!(step, args = %credential.redact(&args.join(" ")), "Running git");

        let output = Command::new("git")
            .args(&args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_AUTHOR_NAME", &self.committer_name)
            .env("GIT_AUTHOR_EMAIL", &self.committer_email)
            .env("GIT_COMMITTER_NAME", &self.committer_name)
            .env("GIT_COMMITTER_EMAIL", &self.committer_email)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| PublishError::Git {
                step,
                message: format!("failed to run git: {err}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(PublishError::Git {
                step,
                message: credential.redact(message),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

impl Publisher for GitPublisher {
    fn publish(
        &self,
        directory: &Path,
        credential: &Credential,
    ) -> Result<PublishReport, PublishError> {
        require_site(directory)?;

        let worktree = tempfile::Builder::new()
            .prefix("tome-publish-")
            .tempdir()
            .map_err(PublishError::io(std::env::temp_dir()))?;
        let root = worktree.path();

        let files = copy_tree(directory, root)?;
        write_marker(root, ".nojekyll", "")?;
        if let Some(cname) = &self.cname {
            write_marker(root, "CNAME", &format!("{}\n", cname.trim()))?;
        }
        let digest = snapshot_digest(root)?;
        let published_at = timestamp();
        let refspec = format!("HEAD:refs/heads/{}", self.branch);
        let head = format!("refs/heads/{}", self.branch);
        let message = format!("Publish snapshot {published_at}");
        let url = credential.authenticate(&self.remote);

        self.git(root, "init", ["init", "--quiet"], credential)?;
        self.git(root, "init", ["symbolic-ref", "HEAD", head.as_str()], credential)?;
        self.git(root, "add", ["add", "--all", "."], credential)?;
        self.git(
            root,
            "commit",
            [
                "-c",
                "commit.gpgsign=false",
                "commit",
                "--quiet",
                "--no-verify",
                "-m",
                message.as_str(),
            ],
            credential,
        )?;
        let revision = self.git(root, "rev-parse", ["rev-parse", "HEAD"], credential)?;
        self.git(
            root,
            "push",
            ["push", "--force", "--quiet", url.as_str(), refspec.as_str()],
            credential,
        )?;

        tracing::info!(
            remote = %credential.redact(&self.remote),
            branch = %self.branch,
            revision = %revision,
            files,
            "Published snapshot"
        );
        close(worktree);

        Ok(PublishReport {
            destination: format!("{}#{}", credential.redact(&self.remote), self.branch),
            files,
            digest,
            revision: Some(revision),
            published_at,
        })
    }
}

fn write_marker(root: &Path, name: &str, content: &str) -> Result<(), PublishError> {
    let path = root.join(name);
    fs::write(&path, content).map_err(PublishError::io(&path))
}

fn close(worktree: TempDir) {
    let path = worktree.path().to_path_buf();
    if let Err(err) = worktree.close() {
        tracing::warn!(path = %path.display(), error = %err, "Failed to remove publish worktree");
    }
}
