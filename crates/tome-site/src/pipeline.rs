//! The render operation: load, validate, build.

use std::path::PathBuf;
use std::sync::Arc;

use tome_book::{Book, BookError, LanguageSupport};
use tome_cache::FileCache;
use tome_check::{CheckError, CheckReport, Checker};
use tome_config::Config;
use tome_renderer::SyntaxHighlighter;

use crate::builder::StaticSiteBuilder;
use crate::error::BuildError;

/// Outcome of a successful render.
#[derive(Debug)]
pub struct RenderReport {
    pub chapters: usize,
    /// Pages written, the index included.
    pub pages: usize,
    /// `None` when validation was disabled.
    pub check: Option<CheckReport>,
    pub output_dir: PathBuf,
    pub warnings: Vec<String>,
}

/// Runs the render operation for one configuration.
///
/// Content errors (missing positions, duplicates, failing samples) are all
/// raised before anything is written to the output directory.
pub struct Pipeline<'a> {
    config: &'a Config,
    cache_version: String,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            cache_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }

    /// Version stamp of the sample cache; a different stamp discards it.
    #[must_use]
    pub fn with_cache_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = version.into();
        self
    }

    /// Languages whose samples are validated, from `[check.languages]`.
    fn language_support(&self) -> LanguageSupport {
        self.config
            .check
            .enabled_languages()
            .fold(LanguageSupport::default(), |support, (tag, lang)| {
                support.with_language(tag, lang.hidden_lines)
            })
    }

    /// Load the book from the configured source directory.
    pub fn load(&self) -> Result<Book, BookError> {
        Book::load(
            self.config.book_resolved.source_dir.clone(),
            self.language_support(),
        )
    }

    /// Validate every sample of `book`; `None` when validation is disabled.
    pub fn check(&self, book: &Book) -> Result<Option<CheckReport>, CheckError> {
        let check = &self.config.check;
        if !check.enabled {
            tracing::info!("Sample validation disabled");
            return Ok(None);
        }

        let mut checker = Checker::from_config(check);
        if check.cache_enabled {
            let cache = FileCache::new(self.config.book_resolved.cache_dir(), &self.cache_version);
            checker = checker.with_cache(&cache);
        }
        Ok(Some(checker.check(book)?))
    }

    /// Load, validate and build the site.
    pub fn render(&self) -> Result<RenderReport, BuildError> {
        let book = self.load()?;
        let check = self.check(&book)?;

        let output_dir = &self.config.book_resolved.build_dir;
        let build = StaticSiteBuilder::from_config(&self.config.book_resolved)
            .with_highlighter(Arc::new(SyntaxHighlighter::new()))
            .build(&book, output_dir)?;

        Ok(RenderReport {
            chapters: book.chapters.len(),
            pages: build.pages,
            check,
            output_dir: build.output_dir,
            warnings: build.warnings,
        })
    }
}
