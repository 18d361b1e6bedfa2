//! Where a publish was triggered from, and whether that may publish.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::PublishError;

/// Event names that mean "a proposed change", never "trunk".
const PULL_REQUEST_EVENTS: &[&str] = &["pull_request", "pull_request_target", "merge_request"];

/// Values given on the command line; they take precedence over the
/// environment.
#[derive(Debug, Default, Clone)]
pub struct TriggerFlags {
    pub event: Option<String>,
    pub git_ref: Option<String>,
}

/// The event and branch that triggered a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContext {
    /// CI event name (`push`, `pull_request`, ...); `None` outside CI.
    pub event: Option<String>,
    /// Branch name; `None` on a detached HEAD outside CI.
    pub git_ref: Option<String>,
}

impl TriggerContext {
    /// Resolve from `flags`, then GitHub Actions variables, then the
    /// branch checked out in the current directory.
    #[must_use]
    pub fn resolve(flags: TriggerFlags) -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::resolve_with(flags, |name| std::env::var(name).ok(), &cwd)
    }

    pub(crate) fn resolve_with(
        flags: TriggerFlags,
        env: impl Fn(&str) -> Option<String>,
        repo: &Path,
    ) -> Self {
        let var = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let event = flags.event.or_else(|| var("GITHUB_EVENT_NAME"));
        // The full ref tells branches from tags; the short name alone does not.
        let git_ref = flags
            .git_ref
            .map(|r| normalize_ref(&r))
            .or_else(|| var("GITHUB_REF").map(|r| normalize_ref(&r)))
            .or_else(|| {
                let name = var("GITHUB_REF_NAME")?;
                Some(match var("GITHUB_REF_TYPE").as_deref() {
                    None | Some("branch") => name,
                    Some(kind) => format!("refs/{kind}s/{name}"),
                })
            })
            .or_else(|| current_branch(repo));

        let context = Self { event, git_ref };
        tracing::debug!(event = ?context.event, git_ref = ?context.git_ref, "Resolved trigger");
        context
    }

    fn is_pull_request(&self) -> bool {
        self.event
            .as_deref()
            .is_some_and(|event| PULL_REQUEST_EVENTS.contains(&event))
    }
}

/// Strip `refs/heads/` so `refs/heads/main` and `main` compare equal.
///
/// Other refs (`refs/tags/main`, `refs/pull/1/merge`) stay whole, so they
/// never match a branch name.
fn normalize_ref(git_ref: &str) -> String {
    git_ref
        .trim()
        .strip_prefix("refs/heads/")
        .unwrap_or(git_ref.trim())
        .to_owned()
}

fn current_branch(repo: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["symbolic-ref", "--quiet", "--short", "HEAD"])
        .current_dir(repo)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let branch = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    (!branch.is_empty()).then_some(branch)
}

/// Allows publishing only from the trunk branch, never from pull requests.
#[derive(Debug, Clone)]
pub struct PublishGuard {
    trunk: String,
}

impl PublishGuard {
    #[must_use]
    pub fn new(trunk: impl Into<String>) -> Self {
        Self {
            trunk: trunk.into(),
        }
    }

    pub fn check(&self, context: &TriggerContext) -> Result<(), PublishError> {
        if context.is_pull_request() {
            return Err(PublishError::PullRequest {
                event: context.event.clone().unwrap_or_default(),
            });
        }
        match context.git_ref.as_deref() {
            Some(git_ref) if git_ref == self.trunk => Ok(()),
            other => Err(PublishError::NotTrunk {
                git_ref: other.unwrap_or("detached HEAD").to_owned(),
                trunk: self.trunk.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn resolve(flags: TriggerFlags, vars: &[(&str, &str)]) -> TriggerContext {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        // A fresh directory is not a repository, so the git fallback yields nothing.
        let dir = tempfile::TempDir::new().unwrap();
        TriggerContext::resolve_with(flags, |name| vars.get(name).cloned(), dir.path())
    }

    fn context(event: Option<&str>, git_ref: Option<&str>) -> TriggerContext {
        TriggerContext {
            event: event.map(str::to_owned),
            git_ref: git_ref.map(str::to_owned),
        }
    }

    #[test]
    fn test_flags_take_precedence() {
        let flags = TriggerFlags {
            event: Some("workflow_dispatch".to_owned()),
            git_ref: Some("refs/heads/release".to_owned()),
        };
        let resolved = resolve(
            flags,
            &[("GITHUB_EVENT_NAME", "push"), ("GITHUB_REF_NAME", "main")],
        );
        assert_eq!(resolved, context(Some("workflow_dispatch"), Some("release")));
    }

    #[test]
    fn test_github_variables() {
        let resolved = resolve(
            TriggerFlags::default(),
            &[("GITHUB_EVENT_NAME", "push"), ("GITHUB_REF_NAME", "main")],
        );
        assert_eq!(resolved, context(Some("push"), Some("main")));
    }

    #[test]
    fn test_full_github_ref_preferred() {
        let resolved = resolve(
            TriggerFlags::default(),
            &[("GITHUB_REF_NAME", "other"), ("GITHUB_REF", "refs/heads/main")],
        );
        assert_eq!(resolved.git_ref.as_deref(), Some("main"));
    }

    #[test]
    fn test_tag_named_like_trunk_is_refused() {
        let guard = PublishGuard::new("main");
        let pushed_tag = resolve(
            TriggerFlags::default(),
            &[
                ("GITHUB_EVENT_NAME", "push"),
                ("GITHUB_REF", "refs/tags/main"),
                ("GITHUB_REF_NAME", "main"),
                ("GITHUB_REF_TYPE", "tag"),
            ],
        );
        assert_eq!(pushed_tag.git_ref.as_deref(), Some("refs/tags/main"));
        assert!(matches!(
            guard.check(&pushed_tag),
            Err(PublishError::NotTrunk { .. })
        ));

        let short_name_only = resolve(
            TriggerFlags::default(),
            &[("GITHUB_REF_NAME", "main"), ("GITHUB_REF_TYPE", "tag")],
        );
        assert_eq!(short_name_only.git_ref.as_deref(), Some("refs/tags/main"));
        assert!(guard.check(&short_name_only).is_err());
    }

    #[test]
    fn test_nothing_resolves_outside_repository() {
        assert_eq!(resolve(TriggerFlags::default(), &[]), context(None, None));
    }

    #[test]
    fn test_guard_allows_trunk() {
        let guard = PublishGuard::new("main");
        assert!(guard.check(&context(Some("push"), Some("main"))).is_ok());
        assert!(guard.check(&context(None, Some("main"))).is_ok());
    }

    #[test]
    fn test_guard_refuses_pull_request() {
        let guard = PublishGuard::new("main");
        let err = guard
            .check(&context(Some("pull_request"), Some("main")))
            .unwrap_err();
        assert!(matches!(err, PublishError::PullRequest { .. }));
    }

    #[test]
    fn test_guard_refuses_other_branches() {
        let guard = PublishGuard::new("main");
        let err = guard
            .check(&context(Some("push"), Some("feature/x")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "refusing to publish from `feature/x`: only `main` is published"
        );

        let err = guard.check(&context(None, None)).unwrap_err();
        assert!(err.to_string().contains("detached HEAD"));
    }
}
