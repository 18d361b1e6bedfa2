//! Configuration management for Tome.
//!
//! Parses `tome.toml` with serde and discovers it in the current directory
//! or any parent. CLI flags are layered on top via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! These string values support `${VAR}` and `${VAR:-default}`:
//!
//! - `book.title`
//! - `publish.remote`
//! - `publish.cname`
//! - `check.languages.*.compile`, `.run` and `.version`, per argument
//!
//! A bare `$` outside `${...}` is never touched.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use expand::EnvExpander;

/// CLI settings that override configuration file values.
///
/// Only `Some` fields are applied.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override chapters directory.
    pub source_dir: Option<PathBuf>,
    /// Override rendered output directory.
    pub build_dir: Option<PathBuf>,
    /// Override sample validation.
    pub check_enabled: Option<bool>,
    /// Override the check results cache.
    pub cache_enabled: Option<bool>,
    /// Override publish remote.
    pub remote: Option<String>,
    /// Override publish branch.
    pub branch: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tome.toml";

/// Project data directory, relative to the config file.
const PROJECT_DIRNAME: &str = ".tome";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Book configuration (paths are relative strings from TOML).
    book: BookConfigRaw,
    /// Code sample validation.
    pub check: CheckConfig,
    /// Publishing.
    pub publish: PublishConfig,

    /// Resolved book configuration (set after loading).
    #[serde(skip)]
    pub book_resolved: BookConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BookConfigRaw {
    title: Option<String>,
    description: Option<String>,
    language: Option<String>,
    source_dir: Option<String>,
    build_dir: Option<String>,
}

/// Resolved book configuration with absolute paths.
#[derive(Debug, Default, Clone)]
pub struct BookConfig {
    /// Book title, shown on the index page and in every page title.
    pub title: String,
    /// Optional blurb rendered under the title on the index page.
    pub description: Option<String>,
    /// `lang` attribute of rendered pages.
    pub language: String,
    /// Directory holding chapter files.
    pub source_dir: PathBuf,
    /// Rendered output directory.
    pub build_dir: PathBuf,
    /// Project data directory (`.tome/`).
    pub project_dir: PathBuf,
}

impl BookConfig {
    /// Cache directory path (`.tome/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }
}

/// Code sample validation configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CheckConfig {
    /// Whether samples are validated during a build.
    pub enabled: bool,
    /// Validate samples concurrently.
    pub parallel: bool,
    /// Cache passing samples between builds.
    pub cache_enabled: bool,
    /// Toolchains keyed by fence language tag.
    ///
    /// Entries from the file are merged over [`default_languages`].
    pub languages: BTreeMap<String, LanguageConfig>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            parallel: true,
            cache_enabled: true,
            languages: default_languages(),
        }
    }
}

impl CheckConfig {
    /// Toolchains that are enabled, keyed by language tag.
    pub fn enabled_languages(&self) -> impl Iterator<Item = (&str, &LanguageConfig)> {
        self.languages
            .iter()
            .filter(|(_, lang)| lang.enabled)
            .map(|(tag, lang)| (tag.as_str(), lang))
    }
}

/// How to build and run samples of one language.
///
/// Argument templates may contain `{src}` (sample source file), `{out}`
/// (build artifact path) and `{dir}` (the sample's scratch directory).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Set to `false` to treat samples of this language as illustrative.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Extension of the source file written for each sample.
    pub extension: String,
    /// Build command; a non-zero exit means "does not compile".
    pub compile: Vec<String>,
    /// Run command, executed after a successful build for `Run` samples.
    #[serde(default)]
    pub run: Option<Vec<String>>,
    /// Command printing the toolchain version, e.g. `rustc --version`.
    ///
    /// Its output is part of the sample cache key, so upgrading the
    /// compiler revalidates every sample.
    #[serde(default)]
    pub version: Option<Vec<String>>,
    /// Wrap samples lacking `fn main` in a main function.
    #[serde(default)]
    pub wrap_main: bool,
    /// Support `# `-prefixed lines that compile but are not displayed.
    #[serde(default)]
    pub hidden_lines: bool,
}

fn default_true() -> bool {
    true
}

/// Built-in toolchains.
///
/// Only Rust is validated out of the box; other languages need an explicit
/// `[check.languages.<tag>]` table.
#[must_use]
pub fn default_languages() -> BTreeMap<String, LanguageConfig> {
    let rust = LanguageConfig {
        enabled: true,
        extension: "rs".to_owned(),
        compile: [
            "rustc",
            "--edition",
            "2021",
            "--crate-name",
            "sample",
            "-o",
            "{out}",
            "{src}",
        ]
        .map(str::to_owned)
        .to_vec(),
        run: Some(vec!["{out}".to_owned()]),
        version: Some(vec!["rustc".to_owned(), "--version".to_owned()]),
        wrap_main: true,
        hidden_lines: true,
    };
    BTreeMap::from([("rust".to_owned(), rust)])
}

/// Publish configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PublishConfig {
    /// Git remote receiving the snapshot.
    pub remote: Option<String>,
    /// Branch overwritten on every publish.
    pub branch: String,
    /// The only branch allowed to trigger a publish.
    pub trunk: String,
    /// Environment variable holding the push token.
    pub token_env: String,
    /// Author and committer name of snapshot commits.
    pub committer_name: String,
    /// Author and committer email of snapshot commits.
    pub committer_email: String,
    /// Custom domain written to a `CNAME` file in the snapshot.
    pub cname: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            remote: None,
            branch: "gh-pages".to_owned(),
            trunk: "main".to_owned(),
            token_env: "GITHUB_TOKEN".to_owned(),
            committer_name: "tome".to_owned(),
            committer_email: "tome@localhost".to_owned(),
            cname: None,
        }
    }
}

impl PublishConfig {
    /// Get the remote, which publishing requires.
    pub fn require_remote(&self) -> Result<&str, ConfigError> {
        let remote = self
            .remote
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("publish.remote is not set".to_owned()))?;
        require_non_empty(remote, "publish.remote")?;
        require_remote_url(remote, "publish.remote")?;
        Ok(remote)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`publish.remote`").
        field: String,
        /// Error message (e.g., "`GH_OWNER` is not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Accept the remote forms `git push` understands.
fn require_remote_url(remote: &str, field: &str) -> Result<(), ConfigError> {
    const SCHEMES: [&str; 4] = ["https://", "ssh://", "git@", "file://"];
    if SCHEMES.iter().any(|s| remote.starts_with(s)) || Path::new(remote).is_absolute() {
        return Ok(());
    }
    Err(ConfigError::Validation(format!(
        "{field} must be an https://, ssh://, git@, file:// URL or an absolute path"
    )))
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `tome.toml` in the current directory and its parents, falling back
    /// to defaults rooted at the current directory.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Parse configuration from a TOML string, resolving paths against `base`.
    pub fn from_toml(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve(base);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.book_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(build_dir) = &settings.build_dir {
            self.book_resolved.build_dir.clone_from(build_dir);
        }
        if let Some(enabled) = settings.check_enabled {
            self.check.enabled = enabled;
        }
        if let Some(enabled) = settings.cache_enabled {
            self.check.cache_enabled = enabled;
        }
        if let Some(remote) = &settings.remote {
            self.publish.remote = Some(remote.clone());
        }
        if let Some(branch) = &settings.branch {
            self.publish.branch.clone_from(branch);
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            book: BookConfigRaw::default(),
            check: CheckConfig::default(),
            publish: PublishConfig::default(),
            book_resolved: BookConfig::default(),
            config_path: None,
        };
        config.resolve(base);
        config
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// The publish remote is only checked by [`PublishConfig::require_remote`],
    /// so a build never fails over publish settings it does not use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.book_resolved.title, "book.title")?;
        require_non_empty(&self.book_resolved.language, "book.language")?;
        self.validate_check()?;
        self.validate_publish()?;
        Ok(())
    }

    fn validate_check(&self) -> Result<(), ConfigError> {
        for (tag, lang) in &self.check.languages {
            let field = format!("check.languages.{tag}");
            require_non_empty(&lang.extension, &format!("{field}.extension"))?;
            if lang.compile.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{field}.compile cannot be empty"
                )));
            }
            if !lang.compile.iter().any(|arg| arg.contains("{src}")) {
                return Err(ConfigError::Validation(format!(
                    "{field}.compile must reference {{src}}"
                )));
            }
            if lang.run.as_ref().is_some_and(Vec::is_empty) {
                return Err(ConfigError::Validation(format!(
                    "{field}.run cannot be empty"
                )));
            }
            if lang.version.as_ref().is_some_and(Vec::is_empty) {
                return Err(ConfigError::Validation(format!(
                    "{field}.version cannot be empty"
                )));
            }
        }
        Ok(())
    }

    fn validate_publish(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.publish.branch, "publish.branch")?;
        require_non_empty(&self.publish.trunk, "publish.trunk")?;
        require_non_empty(&self.publish.token_env, "publish.token_env")?;
        if self.publish.branch == self.publish.trunk {
            return Err(ConfigError::Validation(format!(
                "publish.branch cannot be the trunk branch '{}'",
                self.publish.trunk
            )));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.expand_with(&EnvExpander::from_process())
    }

    fn expand_with<F>(&mut self, env: &EnvExpander<F>) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand_opt = |value: &mut Option<String>, field: &str| -> Result<(), ConfigError> {
            if let Some(text) = value.as_deref() {
                *value = Some(env.expand(field, text)?);
            }
            Ok(())
        };
        expand_opt(&mut self.book.title, "book.title")?;
        expand_opt(&mut self.publish.remote, "publish.remote")?;
        expand_opt(&mut self.publish.cname, "publish.cname")?;

        for (tag, lang) in &mut self.check.languages {
            let field = format!("check.languages.{tag}");
            lang.compile = env.expand_args(&format!("{field}.compile"), &lang.compile)?;
            if let Some(run) = &lang.run {
                lang.run = Some(env.expand_args(&format!("{field}.run"), run)?);
            }
            if let Some(version) = &lang.version {
                lang.version = Some(env.expand_args(&format!("{field}.version"), version)?);
            }
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory and merge the
    /// built-in toolchains under the configured ones.
    fn resolve(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.book_resolved = BookConfig {
            title: self.book.title.clone().unwrap_or_else(|| "Book".to_owned()),
            description: self.book.description.clone(),
            language: self.book.language.clone().unwrap_or_else(|| "en".to_owned()),
            source_dir: resolve(self.book.source_dir.as_deref(), "src"),
            build_dir: resolve(self.book.build_dir.as_deref(), "book"),
            project_dir: config_dir.join(PROJECT_DIRNAME),
        };

        for (tag, lang) in default_languages() {
            self.check.languages.entry(tag).or_insert(lang);
        }
    }
}
