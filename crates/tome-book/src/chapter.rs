//! Chapters and their content blocks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::fence::{Directive, FenceInfo};
use crate::hidden;

/// One titled unit of book content.
#[derive(Debug, Clone)]
pub struct Chapter {
    /// Path relative to the source directory; the chapter's identity.
    pub path: PathBuf,
    /// Chapter title.
    pub title: String,
    /// Ordinal position; defines reading order.
    pub position: u32,
    /// Markdown body with the front matter removed.
    pub markdown: String,
    /// Ordered prose and code blocks of the body.
    pub blocks: Vec<ContentBlock>,
}

impl Chapter {
    /// URL of the rendered page relative to the output root (`traits/intro.html`).
    #[must_use]
    pub fn url_path(&self) -> String {
        self.path
            .with_extension("html")
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Code samples in document order.
    pub fn samples(&self) -> impl Iterator<Item = &CodeSample> {
        self.blocks.iter().filter_map(|block| match block {
            ContentBlock::Code(sample) => Some(sample),
            ContentBlock::Prose(_) => None,
        })
    }
}

/// Prose or an annotated code sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// Markdown source between code samples.
    Prose(String),
    /// Fenced code block.
    Code(CodeSample),
}

/// A fenced code sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSample {
    /// Zero-based position among the chapter's code samples.
    pub index: usize,
    /// One-based line of the opening fence in the chapter file.
    pub line: usize,
    /// Language tag from the fence.
    pub language: String,
    /// Effective directive.
    pub directive: Directive,
    /// Extra `key=value` fence attributes.
    pub attrs: HashMap<String, String>,
    /// Literal source, hidden lines included.
    pub source: String,
    /// Whether `# ` lines are hidden for this sample's language.
    pub hidden_lines: bool,
}

impl CodeSample {
    /// Source shown to readers.
    #[must_use]
    pub fn display_source(&self) -> String {
        if self.hidden_lines {
            hidden::display_source(&self.source)
        } else {
            self.source.clone()
        }
    }

    /// Source handed to the toolchain.
    #[must_use]
    pub fn compile_source(&self) -> String {
        if self.hidden_lines {
            hidden::compile_source(&self.source)
        } else {
            self.source.clone()
        }
    }
}

/// Which languages are validated and which support hidden lines.
///
/// A fence whose language is not listed here is always illustrative.
#[derive(Debug, Default, Clone)]
pub struct LanguageSupport {
    languages: HashMap<String, bool>,
}

impl LanguageSupport {
    /// Register a validated language.
    #[must_use]
    pub fn with_language(mut self, tag: impl Into<String>, hidden_lines: bool) -> Self {
        self.languages.insert(tag.into().to_ascii_lowercase(), hidden_lines);
        self
    }

    fn lookup(&self, tag: &str) -> Option<bool> {
        self.languages.get(tag).copied()
    }
}

pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

/// Body parsed into blocks, plus its first H1.
pub(crate) struct ParsedBody {
    pub blocks: Vec<ContentBlock>,
    pub first_heading: Option<String>,
}

/// Split a chapter body into prose and code blocks.
///
/// `line_offset` is the number of lines preceding `body` in the file.
pub(crate) fn parse_body(body: &str, line_offset: usize, support: &LanguageSupport) -> ParsedBody {
    let mut blocks = Vec::new();
    let mut first_heading = None;
    let mut prose_start = 0;

    let mut current: Option<(FenceInfo, usize, String)> = None;
    let mut heading: Option<String> = None;

    for (event, range) in Parser::new_ext(body, parser_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                push_prose(&mut blocks, &body[prose_start..range.start]);
                let line = line_offset + body[..range.start].matches('\n').count() + 1;
                current = Some((FenceInfo::parse(&info), line, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((info, line, source)) = current.take() {
                    let index = blocks
                        .iter()
                        .filter(|b| matches!(b, ContentBlock::Code(_)))
                        .count();
                    blocks.push(ContentBlock::Code(make_sample(info, index, line, source, support)));
                    prose_start = range.end;
                }
            }
            Event::Text(text) if current.is_some() => {
                if let Some((_, _, source)) = current.as_mut() {
                    source.push_str(&text);
                }
            }
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) if first_heading.is_none() => heading = Some(String::new()),
            Event::Text(text) | Event::Code(text) if heading.is_some() => {
                if let Some(h) = heading.as_mut() {
                    h.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if let Some(h) = heading.take() {
                    first_heading = Some(h.trim().to_owned());
                }
            }
            _ => {}
        }
    }
    push_prose(&mut blocks, &body[prose_start..]);

    ParsedBody {
        blocks,
        first_heading,
    }
}

fn push_prose(blocks: &mut Vec<ContentBlock>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(ContentBlock::Prose(text.to_owned()));
    }
}

fn make_sample(
    info: FenceInfo,
    index: usize,
    line: usize,
    source: String,
    support: &LanguageSupport,
) -> CodeSample {
    let (directive, hidden_lines) = match support.lookup(&info.language) {
        Some(hidden) => (info.directive, hidden),
        None => (Directive::Ignore, false),
    };
    CodeSample {
        index,
        line,
        language: info.language,
        directive,
        attrs: info.attrs,
        source,
        hidden_lines,
    }
}

/// Position from a numeric file name prefix (`03-traits.md` -> 3).
///
/// Returns `Err` with the digits when they overflow.
pub(crate) fn filename_position(path: &Path) -> Option<Result<u32, String>> {
    let stem = path.file_stem()?.to_str()?;
    let digits: String = stem.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let rest = &stem[digits.len()..];
    if !(rest.is_empty() || rest.starts_with(['-', '_', '.', ' '])) {
        return None;
    }
    Some(digits.parse().map_err(|_| digits.clone()))
}

/// Title derived from the file name, numeric prefix removed.
pub(crate) fn filename_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let trimmed = stem
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['-', '_', '.', ' ']);
    let slug = if trimmed.is_empty() { &stem } else { trimmed };

    let mut title = String::with_capacity(slug.len());
    for word in slug.split(['-', '_', ' ']).filter(|w| !w.is_empty()) {
        if !title.is_empty() {
            title.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            title.extend(first.to_uppercase());
            title.push_str(chars.as_str());
        }
    }
    title
}
