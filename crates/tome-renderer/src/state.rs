//! Context tracked while walking Markdown events.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::Alignment;

/// Text collected verbatim until the enclosing element ends: code block
/// bodies and image alt text.
#[derive(Default)]
pub(crate) struct Capture {
    active: bool,
    buffer: String,
}

impl Capture {
    pub fn begin(&mut self) {
        self.active = true;
        self.buffer.clear();
    }

    pub fn finish(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.buffer)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// Column alignments and the cell cursor of the table being rendered.
#[derive(Default)]
pub(crate) struct TableState {
    alignments: Vec<Alignment>,
    column: usize,
    in_head: bool,
}

impl TableState {
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        *self = Self {
            alignments,
            ..Self::default()
        };
    }

    /// Start a row; `head` is true for the header row.
    pub fn start_row(&mut self, head: bool) {
        self.in_head = head;
        self.column = 0;
    }

    pub fn open_cell(&self, out: &mut String) {
        let tag = self.cell_tag();
        let _ = match self.alignments.get(self.column) {
            Some(Alignment::Left) => write!(out, r#"<{tag} style="text-align:left">"#),
            Some(Alignment::Center) => write!(out, r#"<{tag} style="text-align:center">"#),
            Some(Alignment::Right) => write!(out, r#"<{tag} style="text-align:right">"#),
            Some(Alignment::None) | None => write!(out, "<{tag}>"),
        };
    }

    pub fn close_cell(&mut self, out: &mut String) {
        let _ = write!(out, "</{}>", self.cell_tag());
        self.column += 1;
    }

    fn cell_tag(&self) -> &'static str {
        if self.in_head { "th" } else { "td" }
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// A heading ready to be written out.
pub(crate) struct Heading {
    pub level: u8,
    pub id: String,
    pub html: String,
}

/// Heading IDs, table of contents and title extraction.
pub(crate) struct HeadingState {
    extract_title: bool,
    title: Option<String>,
    level: Option<u8>,
    /// Plain text, used for the slug and the ToC.
    text: String,
    /// Inline HTML, used for output.
    html: String,
    toc: Vec<TocEntry>,
    seen_ids: HashMap<String, usize>,
}

impl HeadingState {
    pub fn new(extract_title: bool) -> Self {
        Self {
            extract_title,
            title: None,
            level: None,
            text: String::new(),
            html: String::new(),
            toc: Vec::new(),
            seen_ids: HashMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.level.is_some()
    }

    pub fn begin(&mut self, level: u8) {
        self.level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    pub fn push(&mut self, text: &str, html: &str) {
        self.text.push_str(text);
        self.html.push_str(html);
    }

    /// The first H1 becomes the title when extraction is on; it is still
    /// rendered but left out of the ToC.
    pub fn finish(&mut self) -> Option<Heading> {
        let level = self.level.take()?;
        let title = std::mem::take(&mut self.text).trim().to_owned();
        let id = self.unique_id(&title);

        if self.extract_title && level == 1 && self.title.is_none() {
            self.title = Some(title);
        } else {
            self.toc.push(TocEntry {
                level,
                title,
                id: id.clone(),
            });
        }

        Some(Heading {
            level,
            id,
            html: std::mem::take(&mut self.html).trim().to_owned(),
        })
    }

    fn unique_id(&mut self, text: &str) -> String {
        let mut slug = slugify(text);
        if slug.is_empty() {
            slug.push_str("section");
        }
        let seen = self.seen_ids.entry(slug.clone()).or_default();
        *seen += 1;
        if *seen == 1 {
            slug
        } else {
            format!("{slug}-{}", *seen - 1)
        }
    }

    pub fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    pub fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Convert text to a URL-safe slug.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        let entity = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&#x27;",
            _ => {
                escaped.push(c);
                continue;
            }
        };
        escaped.push_str(entity);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's `impl Trait`?"), "whats-impl-trait");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("  Spaces  "), "spaces");
        assert_eq!(slugify("a -- b"), "a-b");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<T: Display>"), "&lt;T: Display&gt;");
        assert_eq!(escape_html("a && b"), "a &amp;&amp; b");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_capture() {
        let mut capture = Capture::default();
        capture.begin();
        capture.push("fn main");
        capture.push("() {}");
        assert!(capture.is_active());
        assert_eq!(capture.finish(), "fn main() {}");
        assert!(!capture.is_active());
    }

    #[test]
    fn test_table_cells() {
        let mut table = TableState::default();
        table.start(vec![Alignment::Left, Alignment::None, Alignment::Right]);
        let mut out = String::new();

        table.start_row(true);
        for _ in 0..3 {
            table.open_cell(&mut out);
            table.close_cell(&mut out);
        }
        assert_eq!(
            out,
            r#"<th style="text-align:left"></th><th></th><th style="text-align:right"></th>"#
        );

        out.clear();
        table.start_row(false);
        table.open_cell(&mut out);
        table.close_cell(&mut out);
        assert_eq!(out, r#"<td style="text-align:left"></td>"#);
    }

    #[test]
    fn test_heading_title_excluded_from_toc() {
        let mut state = HeadingState::new(true);
        state.begin(1);
        state.push("Ownership", "Ownership");
        let heading = state.finish().unwrap();
        assert_eq!((heading.level, heading.id.as_str()), (1, "ownership"));

        state.begin(2);
        state.push("Moves", "Moves");
        state.finish();

        assert_eq!(state.take_title(), Some("Ownership".to_owned()));
        let toc = state.take_toc();
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].id, "moves");
    }

    #[test]
    fn test_repeated_and_symbol_only_headings() {
        let mut state = HeadingState::new(false);
        let ids: Vec<String> = ["???", "Example", "Example", "Example"]
            .into_iter()
            .map(|text| {
                state.begin(2);
                state.push(text, text);
                state.finish().unwrap().id
            })
            .collect();
        assert_eq!(ids, ["section", "example", "example-1", "example-2"]);
    }
}
