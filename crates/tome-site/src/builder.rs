//! Static site builder.
//!
//! Renders a loaded [`Book`] into a directory of HTML pages. The whole site
//! is written into a staging directory next to the output directory and
//! swapped in with renames, so readers never see a partial site and a
//! failed build leaves the previous output untouched. Every completed site
//! carries a [`BuildManifest`] that `tome publish` checks before upload.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tome_book::{Book, Chapter};
use tome_config::BookConfig;
use tome_renderer::{
    DEFAULT_THEME, HtmlBackend, MarkdownRenderer, SyntaxHighlighter, escape_html, highlight_css,
    relative_path,
};
use tome_snapshot::{BuildManifest, discard, remove_dir_if_exists, sibling, swap_into_place};

use crate::error::BuildError;
use crate::sample::SampleProcessor;
use crate::template::{self, NavItemData, PageData, PageLink, TocData};

const INDEX_PAGE: &str = "index.html";
const BOOK_CSS: &str = "assets/book.css";
const HIGHLIGHT_CSS: &str = "assets/highlight.css";
const BOOK_CSS_CONTENT: &str = include_str!("../assets/book.css");

/// Outcome of a successful build.
#[derive(Debug)]
pub struct BuildReport {
    /// HTML pages written, the index included.
    pub pages: usize,
    pub output_dir: PathBuf,
    /// Non-fatal rendering warnings.
    pub warnings: Vec<String>,
}

struct RenderedPage {
    path: String,
    html: String,
}

/// Builds the static document set for a book.
pub struct StaticSiteBuilder {
    title: String,
    description: Option<String>,
    language: String,
    theme: String,
    highlighter: Arc<SyntaxHighlighter>,
}

impl StaticSiteBuilder {
    /// Create a builder for a book titled `title`.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            language: "en".to_owned(),
            theme: DEFAULT_THEME.to_owned(),
            highlighter: Arc::new(SyntaxHighlighter::new()),
        }
    }

    /// Create a builder from the `[book]` configuration.
    #[must_use]
    pub fn from_config(config: &BookConfig) -> Self {
        let mut builder = Self::new(config.title.clone()).with_language(config.language.clone());
        if let Some(description) = &config.description {
            builder = builder.with_description(description.clone());
        }
        builder
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Use a built-in syntect theme for `assets/highlight.css`.
    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Share an already loaded highlighter.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Arc<SyntaxHighlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Render `book` and replace `output_dir` with the result.
    pub fn build(&self, book: &Book, output_dir: &Path) -> Result<BuildReport, BuildError> {
        let staging = sibling(output_dir, "staging")?;
        let backup = sibling(output_dir, "previous")?;
        let parent = staging.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
        remove_dir_if_exists(&staging)?;

        let written = self.write_site(book, &staging);
        let (pages, warnings) = match written {
            Ok(written) => written,
            Err(err) => {
                discard(&staging);
                return Err(err);
            }
        };

        let expected = book.chapters.len() + 1;
        if pages != expected {
            discard(&staging);
            return Err(BuildError::PageCount {
                expected,
                actual: pages,
            });
        }

        let manifest = BuildManifest::for_site(&staging, pages, book.digest())
            .and_then(|manifest| manifest.write(&staging));
        if let Err(err) = manifest {
            discard(&staging);
            return Err(err.into());
        }

        swap_into_place(&staging, output_dir, &backup)?;
        tracing::info!(pages, output_dir = %output_dir.display(), "Site built");

        Ok(BuildReport {
            pages,
            output_dir: output_dir.to_path_buf(),
            warnings,
        })
    }

    /// Write every page and asset into `root`; returns the distinct page count.
    fn write_site(&self, book: &Book, root: &Path) -> Result<(usize, Vec<String>), BuildError> {
        let css = highlight_css(&self.theme)
            .ok_or_else(|| BuildError::UnknownTheme(self.theme.clone()))?;
        write_file(root, BOOK_CSS, BOOK_CSS_CONTENT)?;
        write_file(root, HIGHLIGHT_CSS, &css)?;

        let mut warnings = Vec::new();
        let mut paths = BTreeSet::new();

        let index = self.render_index(book);
        write_file(root, &index.path, &index.html)?;
        paths.insert(index.path);

        for (i, chapter) in book.chapters.iter().enumerate() {
            let page = self.render_chapter(book, i, &mut warnings);
            tracing::debug!(chapter = %chapter.path.display(), page = %page.path, "Rendered chapter");
            write_file(root, &page.path, &page.html)?;
            paths.insert(page.path);
        }

        for warning in &warnings {
            tracing::warn!(warning = %warning, "Render warning");
        }

        Ok((paths.len(), warnings))
    }

    fn render_index(&self, book: &Book) -> RenderedPage {
        let navigation = navigation(book, INDEX_PAGE, None);
        let html_content =
            template::render_index_content(&self.title, self.description.as_deref(), &navigation);
        let next = book.chapters.first().map(|chapter| link_to(INDEX_PAGE, chapter));

        let html = template::render_page(&PageData {
            title: self.title.clone(),
            book_title: self.title.clone(),
            language: self.language.clone(),
            html_content,
            toc: Vec::new(),
            navigation,
            previous: None,
            next,
            home_path: INDEX_PAGE.to_owned(),
            stylesheets: stylesheets(INDEX_PAGE),
        });

        RenderedPage {
            path: INDEX_PAGE.to_owned(),
            html,
        }
    }

    fn render_chapter(&self, book: &Book, i: usize, warnings: &mut Vec<String>) -> RenderedPage {
        let chapter = &book.chapters[i];
        let path = chapter.url_path();

        let mut renderer = MarkdownRenderer::<HtmlBackend>::new()
            .with_title_extraction()
            .with_highlighter(Arc::clone(&self.highlighter))
            .with_processor(SampleProcessor::for_chapter(
                chapter,
                Arc::clone(&self.highlighter),
            ));
        let result = renderer.render_markdown(&chapter.markdown);
        warnings.extend(result.warnings);

        // Chapters titled by front matter or file name have no H1 of their own.
        let html_content = if result.title.is_some() {
            result.html
        } else {
            format!("<h1>{}</h1>{}", escape_html(&chapter.title), result.html)
        };

        let previous = match i.checked_sub(1) {
            Some(prev) => link_to(&path, &book.chapters[prev]),
            None => PageLink {
                title: self.title.clone(),
                path: relative_path(&path, INDEX_PAGE),
            },
        };
        let next = book.chapters.get(i + 1).map(|next| link_to(&path, next));

        let html = template::render_page(&PageData {
            title: chapter.title.clone(),
            book_title: self.title.clone(),
            language: self.language.clone(),
            html_content,
            toc: result
                .toc
                .into_iter()
                .map(|entry| TocData {
                    level: entry.level,
                    title: entry.title,
                    id: entry.id,
                })
                .collect(),
            navigation: navigation(book, &path, Some(i)),
            previous: Some(previous),
            next,
            home_path: relative_path(&path, INDEX_PAGE),
            stylesheets: stylesheets(&path),
        });

        RenderedPage { path, html }
    }
}

fn navigation(book: &Book, from: &str, active: Option<usize>) -> Vec<NavItemData> {
    book.chapters
        .iter()
        .enumerate()
        .map(|(i, chapter)| NavItemData {
            title: chapter.title.clone(),
            path: relative_path(from, &chapter.url_path()),
            position: chapter.position,
            is_active: active == Some(i),
        })
        .collect()
}

fn link_to(from: &str, chapter: &Chapter) -> PageLink {
    PageLink {
        title: chapter.title.clone(),
        path: relative_path(from, &chapter.url_path()),
    }
}

fn stylesheets(from: &str) -> Vec<String> {
    vec![relative_path(from, BOOK_CSS), relative_path(from, HIGHLIGHT_CSS)]
}

fn write_file(root: &Path, relative: &str, content: &str) -> Result<(), BuildError> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
    }
    fs::write(&path, content).map_err(BuildError::io(&path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tome_book::LanguageSupport;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn book(files: &[(&str, &str)]) -> (TempDir, Book) {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        for (name, content) in files {
            write(&src, name, content);
        }
        let book = Book::load(&src, LanguageSupport::default().with_language("rust", true)).unwrap();
        (tmp, book)
    }

    fn pages(dir: &Path) -> Vec<String> {
        let mut found = Vec::new();
        collect_html(dir, dir, &mut found);
        found.sort();
        found
    }

    fn collect_html(root: &Path, dir: &Path, found: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                collect_html(root, &path, found);
            } else if path.extension().is_some_and(|ext| ext == "html") {
                let rel = path.strip_prefix(root).unwrap();
                found.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    #[test]
    fn test_build_writes_index_and_one_page_per_chapter() {
        let (tmp, book) = book(&[
            ("03-traits.md", "# Traits\n"),
            ("01-intro.md", "# Intro\n"),
            ("02-basics.md", "# Basics\n"),
        ]);
        let out = tmp.path().join("book");

        let report = StaticSiteBuilder::new("The Book").build(&book, &out).unwrap();

        assert_eq!(report.pages, 4);
        assert_eq!(
            pages(&out),
            vec!["01-intro.html", "02-basics.html", "03-traits.html", "index.html"]
        );
        assert!(out.join("assets/book.css").is_file());
        assert!(out.join("assets/highlight.css").is_file());
    }

    #[test]
    fn test_index_lists_chapters_by_position() {
        let (tmp, book) = book(&[
            ("c.md", "---\nposition: 1\n---\n# Third File\n"),
            ("a.md", "---\nposition: 3\n---\n# First File\n"),
            ("b.md", "---\nposition: 2\n---\n# Second File\n"),
        ]);
        let out = tmp.path().join("book");
        StaticSiteBuilder::new("The Book").build(&book, &out).unwrap();

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        let third = index.find("Third File").unwrap();
        let second = index.find("Second File").unwrap();
        let first = index.find("First File").unwrap();
        assert!(third < second && second < first);
    }

    #[test]
    fn test_chapter_page_links_neighbours() {
        let (tmp, book) = book(&[
            ("01-intro.md", "# Intro\n"),
            ("02-basics.md", "# Basics\n\n## Variables\n\nSee [intro](01-intro.md#top).\n"),
            ("03-traits.md", "# Traits\n"),
        ]);
        let out = tmp.path().join("book");
        StaticSiteBuilder::new("The Book").build(&book, &out).unwrap();

        let html = fs::read_to_string(out.join("02-basics.html")).unwrap();
        assert!(html.contains(r#"href="01-intro.html" class="pager-previous""#));
        assert!(html.contains(r#"href="03-traits.html" class="pager-next""#));
        assert!(html.contains(r#"class="chapter-link active" aria-current="page">Basics<"#));
        assert!(html.contains(r##"<a href="#variables">Variables</a>"##));
        assert!(html.contains(r##"href="01-intro.html#top""##));
        assert!(html.contains("<title>Basics - The Book</title>"));
    }

    #[test]
    fn test_nested_chapter_uses_relative_links() {
        let (tmp, book) = book(&[
            ("01-intro.md", "# Intro\n"),
            ("advanced/02-macros.md", "# Macros\n"),
        ]);
        let out = tmp.path().join("book");
        StaticSiteBuilder::new("The Book").build(&book, &out).unwrap();

        let html = fs::read_to_string(out.join("advanced/02-macros.html")).unwrap();
        assert!(html.contains(r#"href="../assets/book.css""#));
        assert!(html.contains(r#"href="../01-intro.html" class="pager-previous""#));
    }

    #[test]
    fn test_title_without_heading_is_added() {
        let (tmp, book) = book(&[("01-getting-started.md", "Plain text only.\n")]);
        let out = tmp.path().join("book");
        StaticSiteBuilder::new("The Book").build(&book, &out).unwrap();

        let html = fs::read_to_string(out.join("01-getting-started.html")).unwrap();
        assert!(html.contains("<h1>Getting Started</h1>"));
    }

    #[test]
    fn test_samples_carry_directive_class() {
        let (tmp, book) = book(&[(
            "01-intro.md",
            "# Intro\n\n```rust,compile_fail\nlet x: i32 = \"nope\";\n```\n",
        )]);
        let out = tmp.path().join("book");
        StaticSiteBuilder::new("The Book").build(&book, &out).unwrap();

        let html = fs::read_to_string(out.join("01-intro.html")).unwrap();
        assert!(html.contains(r#"class="sample sample-compile-fail""#));
    }

    #[test]
    fn test_rebuild_replaces_previous_output() {
        let (tmp, book) = book(&[("01-intro.md", "# Intro\n")]);
        let out = tmp.path().join("book");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.html"), "old").unwrap();

        StaticSiteBuilder::new("The Book").build(&book, &out).unwrap();

        assert!(!out.join("stale.html").exists());
        assert!(out.join("01-intro.html").is_file());
        assert!(!tmp.path().join(".book.staging").exists());
        assert!(!tmp.path().join(".book.previous").exists());
    }

    #[test]
    fn test_failed_build_leaves_previous_output() {
        let (tmp, book) = book(&[("01-intro.md", "# Intro\n")]);
        let out = tmp.path().join("book");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("index.html"), "previous").unwrap();

        let err = StaticSiteBuilder::new("The Book")
            .with_theme("no-such-theme")
            .build(&book, &out)
            .unwrap_err();

        assert!(matches!(err, BuildError::UnknownTheme(_)));
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "previous");
        assert!(!tmp.path().join(".book.staging").exists());
    }

    #[test]
    fn test_build_records_manifest() {
        let (tmp, book) = book(&[("01-intro.md", "# Intro\n"), ("02-basics.md", "# Basics\n")]);
        let out = tmp.path().join("book");
        StaticSiteBuilder::new("The Book").build(&book, &out).unwrap();

        let manifest = BuildManifest::verify(&out).unwrap();
        assert_eq!(manifest.pages, 3);
        assert_eq!(manifest.files, 5);
        assert_eq!(manifest.source_digest, book.digest());
    }

    #[test]
    fn test_builder_from_config() {
        let config = BookConfig {
            title: "Guide".to_owned(),
            description: Some("All about it".to_owned()),
            language: "de".to_owned(),
            source_dir: PathBuf::from("src"),
            build_dir: PathBuf::from("book"),
            project_dir: PathBuf::from(".tome"),
        };
        let builder = StaticSiteBuilder::from_config(&config);
        assert_eq!(builder.title, "Guide");
        assert_eq!(builder.language, "de");
        assert_eq!(builder.description.as_deref(), Some("All about it"));
    }
}
