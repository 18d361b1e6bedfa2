//! Validation of every sample in a book.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tome_book::{Book, CodeSample, Directive};
use tome_cache::{Cache, CacheBucket, CacheBucketExt, NullCacheBucket};
use tome_config::CheckConfig;

use crate::error::{CheckError, SampleFailure, ToolchainError};
use crate::toolchain::{CommandToolchain, Toolchain};

const CACHE_BUCKET: &str = "samples";

/// Counts from a successful check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    /// Samples that went through a toolchain.
    pub validated: usize,
    /// Samples whose passing result came from the cache.
    pub cached: usize,
    /// Illustrative samples and samples without a toolchain.
    pub ignored: usize,
}

#[derive(Serialize, Deserialize)]
struct CachedPass {
    directive: String,
}

enum Verdict {
    Passed { cached: bool },
    Ignored,
    Failed(SampleFailure),
}

/// Validates code samples against their directives.
pub struct Checker {
    toolchains: HashMap<String, Arc<dyn Toolchain>>,
    parallel: bool,
    cache: Box<dyn CacheBucket>,
}

impl Checker {
    /// Checker with no toolchains: every sample is ignored.
    #[must_use]
    pub fn new() -> Self {
        Self {
            toolchains: HashMap::new(),
            parallel: true,
            cache: Box::new(NullCacheBucket),
        }
    }

    /// Checker with a [`CommandToolchain`] for every enabled language.
    #[must_use]
    pub fn from_config(config: &CheckConfig) -> Self {
        config
            .enabled_languages()
            .fold(Self::new(), |checker, (tag, lang)| {
                checker.with_toolchain(tag, CommandToolchain::new(tag, lang.clone()))
            })
            .with_parallel(config.parallel)
    }

    /// Register the toolchain for a fence language tag.
    #[must_use]
    pub fn with_toolchain(
        mut self,
        language: impl Into<String>,
        toolchain: impl Toolchain + 'static,
    ) -> Self {
        self.toolchains
            .insert(language.into().to_ascii_lowercase(), Arc::new(toolchain));
        self
    }

    /// Validate samples concurrently (default) or one at a time.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Remember passing samples in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: &dyn Cache) -> Self {
        self.cache = cache.bucket(CACHE_BUCKET);
        self
    }

    /// Validate every sample of `book`.
    ///
    /// All samples are attempted; failures are reported together in
    /// chapter order, then sample order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Failed`] if any sample misbehaves, or
    /// [`CheckError::Toolchain`] if a toolchain cannot be invoked.
    pub fn check(&self, book: &Book) -> Result<CheckReport, CheckError> {
        let jobs: Vec<(&Path, &CodeSample)> = book
            .chapters
            .iter()
            .flat_map(|c| c.samples().map(move |s| (c.path.as_path(), s)))
            .collect();

        tracing::info!(samples = jobs.len(), parallel = self.parallel, "Checking code samples");

        let verdicts: Vec<Result<Verdict, CheckError>> = if self.parallel {
            jobs.par_iter()
                .map(|(chapter, sample)| self.evaluate(chapter, sample))
                .collect()
        } else {
            jobs.iter()
                .map(|(chapter, sample)| self.evaluate(chapter, sample))
                .collect()
        };

        let mut report = CheckReport::default();
        let mut failures = Vec::new();
        for verdict in verdicts {
            match verdict? {
                Verdict::Passed { cached: true } => report.cached += 1,
                Verdict::Passed { cached: false } => report.validated += 1,
                Verdict::Ignored => report.ignored += 1,
                Verdict::Failed(failure) => {
                    tracing::warn!(
                        chapter = %failure.chapter.display(),
                        line = failure.line,
                        directive = %failure.directive,
                        reason = %failure.reason,
                        "Code sample failed"
                    );
                    failures.push(failure);
                }
            }
        }

        if !failures.is_empty() {
            return Err(CheckError::Failed(failures));
        }

        tracing::info!(
            validated = report.validated,
            cached = report.cached,
            ignored = report.ignored,
            "Code samples passed"
        );
        Ok(report)
    }

    fn evaluate(&self, chapter: &Path, sample: &CodeSample) -> Result<Verdict, CheckError> {
        if !sample.directive.is_validated() {
            return Ok(Verdict::Ignored);
        }
        let Some(toolchain) = self.toolchains.get(&sample.language) else {
            tracing::debug!(language = %sample.language, "No toolchain, sample not validated");
            return Ok(Verdict::Ignored);
        };

        let source = toolchain.prepare(&sample.compile_source());
        let key = cache_key(sample.directive, &source);
        let etag = toolchain.fingerprint();
        if self.cache.get_json::<CachedPass>(&key, &etag).is_some() {
            return Ok(Verdict::Passed { cached: true });
        }

        let toolchain_err = |source: ToolchainError| CheckError::Toolchain {
            language: sample.language.clone(),
            source,
        };
        let failure = |reason: String, stderr: String| {
            Verdict::Failed(SampleFailure {
                chapter: chapter.to_path_buf(),
                index: sample.index,
                line: sample.line,
                language: sample.language.clone(),
                directive: sample.directive,
                reason,
                stderr,
            })
        };

        let scratch = tempfile::Builder::new()
            .prefix("tome-sample-")
            .tempdir()
            .map_err(|source| {
                toolchain_err(ToolchainError::Io {
                    path: std::env::temp_dir(),
                    source,
                })
            })?;

        let build = toolchain
            .build(scratch.path(), &source)
            .map_err(toolchain_err)?;

        let verdict = match sample.directive {
            Directive::CompileFail if build.success => {
                failure("unexpectedly compiled".to_owned(), String::new())
            }
            Directive::CompileFail => Verdict::Passed { cached: false },
            _ if !build.success => failure("failed to compile".to_owned(), build.diagnostics),
            Directive::Run => {
                let run = toolchain.run(scratch.path()).map_err(toolchain_err)?;
                if run.success {
                    Verdict::Passed { cached: false }
                } else {
                    let status = run
                        .code
                        .map_or_else(|| "a signal".to_owned(), |c| format!("status {c}"));
                    failure(format!("exited with {status}"), run.diagnostics)
                }
            }
            Directive::BuildOnly | Directive::Ignore => Verdict::Passed { cached: false },
        };

        if matches!(verdict, Verdict::Passed { .. }) {
            self.cache.set_json(
                &key,
                &etag,
                &CachedPass {
                    directive: sample.directive.as_str().to_owned(),
                },
            );
        }
        Ok(verdict)
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key(directive: Directive, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(directive.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
