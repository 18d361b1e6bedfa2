//! Markdown event walker with a pluggable output backend.

use std::fmt::Write;
use std::marker::PhantomData;
use std::sync::Arc;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use tome_book::FenceInfo;

use crate::backend::RenderBackend;
use crate::code_block::{CodeBlock, CodeBlockProcessor, ProcessResult};
use crate::highlight::SyntaxHighlighter;
use crate::state::{Capture, HeadingState, TableState, TocEntry, escape_html};
use crate::util::heading_level_to_num;

/// Result of rendering one Markdown document.
#[derive(Clone, Debug)]
pub struct RenderResult {
    pub html: String,
    /// Text of the first H1, when title extraction is enabled.
    pub title: Option<String>,
    pub toc: Vec<TocEntry>,
    /// Warnings reported by code block processors.
    pub warnings: Vec<String>,
}

/// Renders Markdown to HTML, delegating output-specific markup to `B`.
///
/// Lists, tables and inline formatting are handled here; the backend
/// renders code blocks, images, quotes and rewrites link targets.
///
/// # Code blocks
///
/// Fenced blocks go through the registered processors first (see
/// [`with_processor`](Self::with_processor)), then through the highlighter if
/// one is set, and finally through the backend.
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    heading: HeadingState,
    table: TableState,
    code: Capture,
    /// Fence info of the block in `code`; `None` for indented blocks.
    code_info: Option<String>,
    fenced_blocks: usize,
    alt_text: Capture,
    /// Source and title of the image whose alt text is being captured.
    image: Option<(String, String)>,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    highlighter: Option<Arc<SyntaxHighlighter>>,
    gfm: bool,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    /// Create a renderer with GitHub Flavored Markdown enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            heading: HeadingState::new(false),
            table: TableState::default(),
            code: Capture::default(),
            code_info: None,
            fenced_blocks: 0,
            alt_text: Capture::default(),
            image: None,
            processors: Vec::new(),
            highlighter: None,
            gfm: true,
            _backend: PhantomData,
        }
    }

    /// Use the first H1 as the page title.
    ///
    /// The heading is still rendered but left out of the table of contents.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    /// Toggle tables, strikethrough and task lists.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Highlight fenced code blocks that no processor claims.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Arc<SyntaxHighlighter>) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    /// Add a code block processor.
    ///
    /// Processors are asked in the order they were added; the first
    /// returning [`ProcessResult::Inline`] wins.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        let parser = Parser::new_ext(markdown, self.parser_options());
        self.render(parser)
    }

    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            match event {
                Event::Start(tag) => self.open(tag),
                Event::End(tag) => self.close(tag),
                Event::Text(text) => self.text(&text),
                Event::Code(code) => self.inline_code(&code),
                Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
                Event::SoftBreak => self.soft_break(),
                Event::HardBreak => B::hard_break(&mut self.output),
                Event::Rule => B::horizontal_rule(&mut self.output),
                Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
                Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
            }
        }

        let warnings = self
            .processors
            .iter()
            .flat_map(|p| p.warnings().iter().cloned())
            .collect();
        RenderResult {
            html: std::mem::take(&mut self.output),
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
            warnings,
        }
    }

    /// Inline markup lands in the heading buffer while a heading is open.
    fn push_inline(&mut self, html: &str) {
        if self.heading.is_active() {
            self.heading.push("", html);
        } else {
            self.output.push_str(html);
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        if let Some(html) = inline_open(&tag) {
            self.push_inline(html);
            return;
        }
        if let Some(html) = block_open(&tag) {
            self.output.push_str(html);
            return;
        }
        match tag {
            // Written on close, once the ID is known.
            Tag::Heading { level, .. } => self.heading.begin(heading_level_to_num(level)),
            Tag::BlockQuote(_) => B::blockquote_start(&mut self.output),
            Tag::CodeBlock(kind) => {
                self.code_info = match kind {
                    CodeBlockKind::Fenced(info) => Some(info.into_string()),
                    CodeBlockKind::Indented => None,
                };
                self.code.begin();
            }
            Tag::List(None) => self.output.push_str("<ul>"),
            Tag::List(Some(1)) => self.output.push_str("<ol>"),
            Tag::List(Some(start)) => {
                let _ = write!(self.output, r#"<ol start="{start}">"#);
            }
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_row(true);
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row(false);
                self.output.push_str("<tr>");
            }
            Tag::TableCell => self.table.open_cell(&mut self.output),
            Tag::Link { dest_url, .. } => {
                let link = format!(r#"<a href="{}">"#, escape_html(&B::transform_link(&dest_url)));
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.alt_text.begin();
                self.image = Some((dest_url.into_string(), title.into_string()));
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        if let Some(html) = inline_close(tag) {
            self.push_inline(html);
            return;
        }
        if let Some(html) = block_close(tag) {
            self.output.push_str(html);
            return;
        }
        match tag {
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.finish() {
                    let level = heading.level;
                    let _ = write!(
                        self.output,
                        r#"<h{level} id="{}">{}</h{level}>"#,
                        heading.id, heading.html
                    );
                }
            }
            TagEnd::BlockQuote(_) => B::blockquote_end(&mut self.output),
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.start_row(false);
            }
            TagEnd::TableCell => self.table.close_cell(&mut self.output),
            TagEnd::Image => {
                let alt = self.alt_text.finish();
                if let Some((src, title)) = self.image.take() {
                    B::image(&src, &alt, &title, &mut self.output);
                }
            }
            _ => {}
        }
    }

    fn finish_code_block(&mut self) {
        let content = self.code.finish();
        let Some(info) = self.code_info.take() else {
            B::code_block(None, &content, &mut self.output);
            return;
        };

        let fence = FenceInfo::parse(&info);
        let language = fence.language.as_str();
        let block = CodeBlock {
            index: self.fenced_blocks,
            language,
            info: &info,
            attrs: &fence.attrs,
            source: &content,
        };
        self.fenced_blocks += 1;

        let claimed = self
            .processors
            .iter_mut()
            .find_map(|processor| match processor.process(&block) {
                ProcessResult::Inline(html) => Some(html),
                ProcessResult::PassThrough => None,
            });
        if let Some(html) = claimed {
            self.output.push_str(&html);
        } else if let Some(highlighter) = &self.highlighter {
            self.output
                .push_str(&highlighter.highlight(language, &content).html);
        } else {
            let lang = (!language.is_empty()).then_some(language);
            B::code_block(lang, &content, &mut self.output);
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push(text);
        } else if self.alt_text.is_active() {
            self.alt_text.push(text);
        } else if self.heading.is_active() {
            self.heading.push(text, &escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.alt_text.is_active() {
            self.alt_text.push(code);
            return;
        }
        let html = format!("<code>{}</code>", escape_html(code));
        if self.heading.is_active() {
            self.heading.push(code, &html);
        } else {
            self.output.push_str(&html);
        }
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push("\n");
        } else if self.heading.is_active() {
            self.heading.push(" ", " ");
        } else {
            self.output.push('\n');
        }
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}

fn inline_open(tag: &Tag<'_>) -> Option<&'static str> {
    Some(match tag {
        Tag::Emphasis => "<em>",
        Tag::Strong => "<strong>",
        Tag::Strikethrough => "<s>",
        Tag::Superscript => "<sup>",
        Tag::Subscript => "<sub>",
        _ => return None,
    })
}

fn inline_close(tag: TagEnd) -> Option<&'static str> {
    Some(match tag {
        TagEnd::Emphasis => "</em>",
        TagEnd::Strong => "</strong>",
        TagEnd::Strikethrough => "</s>",
        TagEnd::Superscript => "</sup>",
        TagEnd::Subscript => "</sub>",
        TagEnd::Link => "</a>",
        _ => return None,
    })
}

fn block_open(tag: &Tag<'_>) -> Option<&'static str> {
    Some(match tag {
        Tag::Paragraph => "<p>",
        Tag::Item => "<li>",
        Tag::DefinitionList => "<dl>",
        Tag::DefinitionListTitle => "<dt>",
        Tag::DefinitionListDefinition => "<dd>",
        _ => return None,
    })
}

fn block_close(tag: TagEnd) -> Option<&'static str> {
    Some(match tag {
        TagEnd::Paragraph => "</p>",
        TagEnd::Item => "</li>",
        TagEnd::List(true) => "</ol>",
        TagEnd::List(false) => "</ul>",
        TagEnd::DefinitionList => "</dl>",
        TagEnd::DefinitionListTitle => "</dt>",
        TagEnd::DefinitionListDefinition => "</dd>",
        TagEnd::Table => "</tbody></table>",
        TagEnd::TableRow => "</tr>",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HtmlBackend;
    use pretty_assertions::assert_eq;

    fn render_html(markdown: &str) -> RenderResult {
        MarkdownRenderer::<HtmlBackend>::new().render_markdown(markdown)
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render_html("Hello, world!").html, "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_with_id_and_toc() {
        let result = render_html("## Trait Objects");
        assert_eq!(result.html, r#"<h2 id="trait-objects">Trait Objects</h2>"#);
        assert_eq!(
            result.toc,
            vec![TocEntry {
                level: 2,
                title: "Trait Objects".to_owned(),
                id: "trait-objects".to_owned(),
            }]
        );
    }

    #[test]
    fn test_title_extraction() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_title_extraction()
            .render_markdown("# Lifetimes\n\nIntro\n\n## Elision");

        assert_eq!(result.title.as_deref(), Some("Lifetimes"));
        assert!(result.html.contains(r#"<h1 id="lifetimes">Lifetimes</h1>"#));
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].id, "elision");
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let result = render_html("## Example\n\n## Example");
        assert_eq!(result.toc[0].id, "example");
        assert_eq!(result.toc[1].id, "example-1");
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = render_html("## The `Drop` trait");
        assert!(result.html.contains("<code>Drop</code>"));
        assert_eq!(result.toc[0].title, "The Drop trait");
        assert_eq!(result.toc[0].id, "the-drop-trait");
    }

    #[test]
    fn test_markdown_links_rewritten() {
        let result = render_html("See [traits](02-traits.md#objects) and [docs](https://doc.rust-lang.org).");
        assert!(result.html.contains(r#"<a href="02-traits.html#objects">"#));
        assert!(result.html.contains(r#"<a href="https://doc.rust-lang.org">"#));
    }

    #[test]
    fn test_plain_code_block_without_highlighter() {
        let result = render_html("```rust\nfn main() {}\n```");
        assert_eq!(
            result.html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_fence_flags_do_not_leak_into_language() {
        let result = render_html("```rust,ignore\nlet x = 1;\n```");
        assert!(result.html.contains(r#"class="language-rust""#));
    }

    #[test]
    fn test_indented_code_block() {
        let result = render_html("Text\n\n    let x = 1;\n");
        assert!(result.html.contains("<pre><code>let x = 1;\n</code></pre>"));
    }

    #[test]
    fn test_highlighter_used_for_fenced_blocks() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_highlighter(Arc::new(SyntaxHighlighter::new()))
            .render_markdown("```rust\nfn main() {}\n```");
        assert!(result.html.starts_with(r#"<pre class="highlight">"#));
        assert!(result.html.contains("hl-"));
    }

    #[test]
    fn test_table() {
        let result = render_html("| A | B |\n|:--|--:|\n| 1 | 2 |");
        assert!(result.html.contains("<table><thead><tr>"));
        assert!(result.html.contains(r#"<th style="text-align:left">A</th>"#));
        assert!(result.html.contains(r#"<td style="text-align:right">2</td>"#));
    }

    #[test]
    fn test_task_list_and_strikethrough() {
        let result = render_html("- [x] ~~done~~\n- [ ] todo");
        assert!(result.html.contains(r#"<input type="checkbox" checked disabled> "#));
        assert!(result.html.contains("<s>done</s>"));
    }

    #[test]
    fn test_gfm_disabled() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_gfm(false)
            .render_markdown("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(!result.html.contains("<table>"));
    }

    #[test]
    fn test_image_alt_text() {
        let result = render_html("![Stack `frame`](stack.png)");
        assert!(result.html.contains(r#"<img src="stack.png" alt="Stack frame">"#));
    }

    struct UppercaseProcessor {
        warnings: Vec<String>,
    }

    impl CodeBlockProcessor for UppercaseProcessor {
        fn process(&mut self, block: &CodeBlock<'_>) -> ProcessResult {
            if block.language == "shout" {
                assert_eq!(block.info, "Shout,loud volume=11");
                assert_eq!(block.attrs.get("volume").map(String::as_str), Some("11"));
                self.warnings.push(format!("block {} shouted", block.index));
                ProcessResult::Inline(block.source.to_uppercase())
            } else {
                ProcessResult::PassThrough
            }
        }

        fn warnings(&self) -> &[String] {
            &self.warnings
        }
    }

    #[test]
    fn test_processor_inline_and_passthrough() {
        let markdown =
            "```rust\nfn main() {}\n```\n\n```Shout,loud volume=11\nhi\n```\n\n```\nbare\n```";
        let mut renderer = MarkdownRenderer::<HtmlBackend>::new().with_processor(UppercaseProcessor {
            warnings: Vec::new(),
        });
        let result = renderer.render_markdown(markdown);

        assert!(result.html.contains(r#"class="language-rust""#));
        assert!(result.html.contains("HI\n"));
        assert!(result.html.contains("<pre><code>bare\n</code></pre>"));
        assert_eq!(result.warnings, vec!["block 1 shouted".to_owned()]);
    }
}
