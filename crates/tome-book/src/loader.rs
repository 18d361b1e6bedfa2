//! Chapter discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::chapter::{self, Chapter, LanguageSupport};
use crate::error::BookError;
use crate::front_matter;

const INDEX_FILE: &str = "index.md";

/// An ordered set of chapters.
#[derive(Debug, Clone)]
pub struct Book {
    /// Directory the chapters were loaded from.
    pub source_dir: PathBuf,
    /// Chapters sorted by ascending position.
    pub chapters: Vec<Chapter>,
}

impl Book {
    /// Load every chapter under `source_dir`.
    ///
    /// # Errors
    ///
    /// Returns the first content error encountered, including duplicate positions.
    pub fn load(source_dir: impl Into<PathBuf>, support: LanguageSupport) -> Result<Self, BookError> {
        BookLoader::new(source_dir).with_languages(support).load()
    }

    /// Total number of code samples across all chapters.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.chapters.iter().map(|c| c.samples().count()).sum()
    }

    /// SHA-256 over every chapter's path, position, title and body.
    ///
    /// A rendered set records the digest of the book it came from, so a
    /// publish can tell whether the output still matches the sources.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for chapter in &self.chapters {
            for field in [
                chapter.path.to_string_lossy().replace('\\', "/").as_bytes(),
                chapter.position.to_string().as_bytes(),
                chapter.title.as_bytes(),
                chapter.markdown.as_bytes(),
            ] {
                hasher.update((field.len() as u64).to_le_bytes());
                hasher.update(field);
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Loads chapters from a source directory.
pub struct BookLoader {
    source_dir: PathBuf,
    support: LanguageSupport,
}

impl BookLoader {
    /// Create a loader with no validated languages.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            support: LanguageSupport::default(),
        }
    }

    /// Set the languages whose samples are validated.
    #[must_use]
    pub fn with_languages(mut self, support: LanguageSupport) -> Self {
        self.support = support;
        self
    }

    /// Scan, parse and order the chapters.
    ///
    /// # Errors
    ///
    /// Returns [`BookError`] naming the offending file.
    pub fn load(&self) -> Result<Book, BookError> {
        if !self.source_dir.is_dir() {
            return Err(BookError::SourceNotFound(self.source_dir.clone()));
        }

        let mut files = Vec::new();
        collect_markdown(&self.source_dir, &self.source_dir, &mut files)?;

        let mut chapters = files
            .iter()
            .map(|rel| self.load_chapter(rel))
            .collect::<Result<Vec<_>, _>>()?;

        // Stable sort: equal positions keep scan order, so `first` is deterministic.
        chapters.sort_by_key(|c| c.position);
        if let Some(pair) = chapters.windows(2).find(|w| w[0].position == w[1].position) {
            return Err(BookError::DuplicatePosition {
                position: pair[0].position,
                first: pair[0].path.clone(),
                second: pair[1].path.clone(),
            });
        }

        tracing::info!(
            source_dir = %self.source_dir.display(),
            chapters = chapters.len(),
            "Book loaded"
        );

        Ok(Book {
            source_dir: self.source_dir.clone(),
            chapters,
        })
    }

    fn load_chapter(&self, rel: &Path) -> Result<Chapter, BookError> {
        if rel.as_os_str().eq_ignore_ascii_case(INDEX_FILE) {
            return Err(BookError::ReservedName(rel.to_path_buf()));
        }

        let full = self.source_dir.join(rel);
        let content = fs::read_to_string(&full).map_err(|source| BookError::Io {
            path: full.clone(),
            source,
        })?;

        let split = front_matter::split(&content);
        let meta = match split.yaml {
            Some(yaml) => front_matter::parse(yaml).map_err(|message| {
                BookError::InvalidFrontMatter {
                    path: rel.to_path_buf(),
                    message,
                }
            })?,
            None => front_matter::FrontMatter::default(),
        };

        let position = resolve_position(rel, meta.position.as_ref())?;
        let parsed = chapter::parse_body(split.body, split.line_offset, &self.support);
        let title = meta
            .title
            .filter(|t| !t.trim().is_empty())
            .or(parsed.first_heading)
            .unwrap_or_else(|| chapter::filename_title(rel));

        tracing::debug!(
            path = %rel.display(),
            position,
            blocks = parsed.blocks.len(),
            "Loaded chapter"
        );

        Ok(Chapter {
            path: rel.to_path_buf(),
            title,
            position,
            markdown: split.body.to_owned(),
            blocks: parsed.blocks,
        })
    }
}

fn resolve_position(rel: &Path, value: Option<&serde_yaml::Value>) -> Result<u32, BookError> {
    if let Some(value) = value {
        return value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| BookError::MalformedPosition {
                path: rel.to_path_buf(),
                value: front_matter::describe(value),
            });
    }

    match chapter::filename_position(rel) {
        Some(Ok(position)) => Ok(position),
        Some(Err(value)) => Err(BookError::MalformedPosition {
            path: rel.to_path_buf(),
            value,
        }),
        None => Err(BookError::MissingPosition(rel.to_path_buf())),
    }
}

/// Collect `.md` files under `current` as paths relative to `base`, in name order.
fn collect_markdown(base: &Path, current: &Path, files: &mut Vec<PathBuf>) -> Result<(), BookError> {
    let io_err = |source| BookError::Io {
        path: current.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(current)
        .map_err(io_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().map_err(io_err)?.is_dir();
        if is_dir {
            collect_markdown(base, &path, files)?;
        } else if path.extension().is_some_and(|e| e == "md") {
            if let Ok(rel) = path.strip_prefix(base) {
                files.push(rel.to_path_buf());
            }
        }
    }
    Ok(())
}
