//! Toolchains that build and run code samples.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use tome_config::LanguageConfig;

use crate::error::ToolchainError;
use crate::wrap::wrap_main;

/// Exit status and diagnostics of one toolchain step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    /// Captured stderr (stdout when stderr is empty).
    pub diagnostics: String,
}

impl Outcome {
    /// Successful step with no output.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            diagnostics: String::new(),
        }
    }
}

/// Builds and runs samples of one language.
///
/// Each call gets its own scratch directory, so implementations can run
/// concurrently without sharing state.
pub trait Toolchain: Send + Sync {
    /// Identity of the toolchain configuration and compiler version; keys
    /// cached results.
    fn fingerprint(&self) -> String;

    /// Turn displayed sample source into a compilable program.
    fn prepare(&self, source: &str) -> String;

    /// Build the prepared `source` inside `dir`.
    fn build(&self, dir: &Path, source: &str) -> Result<Outcome, ToolchainError>;

    /// Run the artifact produced by a successful [`build`](Self::build) in `dir`.
    fn run(&self, dir: &Path) -> Result<Outcome, ToolchainError>;
}

/// [`Toolchain`] driven by command templates from the configuration.
///
/// Templates may use `{src}`, `{out}` and `{dir}`.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    language: String,
    config: LanguageConfig,
    /// Output of the `version` command, queried once.
    version: OnceLock<String>,
}

impl CommandToolchain {
    #[must_use]
    pub fn new(language: impl Into<String>, config: LanguageConfig) -> Self {
        Self {
            language: language.into(),
            config,
            version: OnceLock::new(),
        }
    }

    /// What the configured `version` command prints, or a marker when it
    /// cannot tell; empty when no command is configured.
    fn version(&self) -> &str {
        self.version.get_or_init(|| {
            let Some(command) = &self.config.version else {
                return String::new();
            };
            match Self::exec(command, Path::new(".")) {
                Ok(outcome) if outcome.success => outcome.diagnostics.trim().to_owned(),
                Ok(outcome) => format!("unknown (exit {:?})", outcome.code),
                Err(err) => {
                    tracing::debug!(language = %self.language, error = %err, "Toolchain version unavailable");
                    "unavailable".to_owned()
                }
            }
        })
    }

    fn src_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("sample.{}", self.config.extension))
    }

    fn out_path(dir: &Path) -> PathBuf {
        dir.join(format!("sample{}", std::env::consts::EXE_SUFFIX))
    }

    fn expand(&self, template: &[String], dir: &Path) -> Vec<String> {
        let src = self.src_path(dir);
        let out = Self::out_path(dir);
        template
            .iter()
            .map(|arg| {
                arg.replace("{src}", &src.to_string_lossy())
                    .replace("{out}", &out.to_string_lossy())
                    .replace("{dir}", &dir.to_string_lossy())
            })
            .collect()
    }

    fn exec(args: &[String], dir: &Path) -> Result<Outcome, ToolchainError> {
        let (program, rest) = args.split_first().ok_or(ToolchainError::EmptyCommand)?;
        tracing::trace!(program, args = ?rest, "Running toolchain step");

        let output = Command::new(program)
            .args(rest)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolchainError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            stderr.into_owned()
        };

        Ok(Outcome {
            success: output.status.success(),
            code: output.status.code(),
            diagnostics,
        })
    }
}

impl Toolchain for CommandToolchain {
    fn fingerprint(&self) -> String {
        let mut parts = vec![self.language.clone(), self.config.compile.join(" ")];
        if let Some(run) = &self.config.run {
            parts.push(run.join(" "));
        }
        parts.push(self.config.wrap_main.to_string());
        parts.push(self.version().to_owned());
        parts.join("\u{1f}")
    }

    fn prepare(&self, source: &str) -> String {
        if self.config.wrap_main {
            wrap_main(source)
        } else {
            source.to_owned()
        }
    }

    fn build(&self, dir: &Path, source: &str) -> Result<Outcome, ToolchainError> {
        let src = self.src_path(dir);
        fs::write(&src, source).map_err(|source| ToolchainError::Io { path: src, source })?;
        Self::exec(&self.expand(&self.config.compile, dir), dir)
    }

    /// Languages without a run template are only built.
    fn run(&self, dir: &Path) -> Result<Outcome, ToolchainError> {
        match &self.config.run {
            Some(run) => Self::exec(&self.expand(run, dir), dir),
            None => Ok(Outcome::ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_config::default_languages;

    fn shell_toolchain(compile: &str, run: Option<&str>) -> CommandToolchain {
        CommandToolchain::new(
            "sh",
            LanguageConfig {
                enabled: true,
                extension: "sh".to_owned(),
                compile: vec!["sh".to_owned(), "-c".to_owned(), compile.to_owned()],
                run: run.map(|r| vec!["sh".to_owned(), "-c".to_owned(), r.to_owned()]),
                version: None,
                wrap_main: false,
                hidden_lines: false,
            },
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_expand_templates() {
        let toolchain = CommandToolchain::new("rust", default_languages()["rust"].clone());
        let dir = Path::new("/scratch");
        let args = toolchain.expand(&toolchain.config.compile, dir);
        assert_eq!(args[0], "rustc");
        assert!(args.contains(&"/scratch/sample.rs".to_owned()));
        assert!(args.contains(&format!("/scratch/sample{}", std::env::consts::EXE_SUFFIX)));
    }

    #[test]
    fn test_prepare_wraps_main_for_rust() {
        let toolchain = CommandToolchain::new("rust", default_languages()["rust"].clone());
        assert!(toolchain.prepare("let x = 1;").contains("fn main() {"));
    }

    #[test]
    fn test_fingerprint_changes_with_command() {
        let a = shell_toolchain("true", None);
        let b = shell_toolchain("test -s {src}", None);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[cfg(unix)]
    #[test]
    fn test_fingerprint_changes_with_compiler_version() {
        let dir = tempfile::TempDir::new().unwrap();
        let version_file = dir.path().join("version");
        let versioned = || {
            let mut toolchain = shell_toolchain("true", None);
            toolchain.config.version = Some(vec![
                "cat".to_owned(),
                version_file.to_string_lossy().into_owned(),
            ]);
            toolchain
        };

        fs::write(&version_file, "shc 1.90.0\n").unwrap();
        let before = versioned();
        assert!(before.fingerprint().ends_with("shc 1.90.0"));

        fs::write(&version_file, "shc 1.91.0\n").unwrap();
        let after = versioned();
        assert_ne!(before.fingerprint(), after.fingerprint());
        // Queried once per toolchain, not per sample.
        assert_eq!(before.fingerprint(), before.fingerprint());
    }

    #[test]
    fn test_missing_version_command_still_fingerprints() {
        let mut toolchain = shell_toolchain("true", None);
        toolchain.config.version = Some(vec!["tome-no-such-compiler-xyz".to_owned()]);
        assert!(toolchain.fingerprint().ends_with("unavailable"));
    }

    #[cfg(unix)]
    #[test]
    fn test_build_writes_source_and_reports_status() {
        let dir = tempfile::TempDir::new().unwrap();
        let toolchain = shell_toolchain("grep -q ok {src} || { echo broken >&2; exit 3; }", None);

        let passed = toolchain.build(dir.path(), "ok\n").unwrap();
        assert!(passed.success);

        let failed = toolchain.build(dir.path(), "nope\n").unwrap();
        assert!(!failed.success);
        assert_eq!(failed.code, Some(3));
        assert_eq!(failed.diagnostics.trim(), "broken");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_without_template_succeeds() {
        let dir = tempfile::TempDir::new().unwrap();
        let toolchain = shell_toolchain("true", None);
        assert!(toolchain.run(dir.path()).unwrap().success);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let toolchain = CommandToolchain::new(
            "nothing",
            LanguageConfig {
                enabled: true,
                extension: "txt".to_owned(),
                compile: vec!["tome-no-such-compiler-xyz".to_owned(), "{src}".to_owned()],
                run: None,
                version: None,
                wrap_main: false,
                hidden_lines: false,
            },
        );
        let err = toolchain.build(dir.path(), "x").unwrap_err();
        assert!(matches!(err, ToolchainError::Spawn { .. }));
    }
}
