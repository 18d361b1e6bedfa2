//! Code sample markup.

use std::fmt::Write;
use std::sync::Arc;

use tome_book::{Chapter, Directive};
use tome_renderer::{CodeBlock, CodeBlockProcessor, ProcessResult, SyntaxHighlighter};

/// Languages rendered as plain text without a warning.
const PLAIN_LANGUAGES: &[&str] = &["", "text", "txt", "plain", "output"];

#[derive(Debug, Clone, Copy)]
struct SampleMeta {
    directive: Directive,
    hidden_lines: bool,
}

/// Renders a chapter's fenced blocks as highlighted samples.
///
/// The wrapper carries the directive as a `sample-{directive}` class, and
/// hidden lines are stripped from the displayed source. Blocks are matched
/// to the chapter's samples by their index among fenced blocks.
pub struct SampleProcessor {
    chapter: String,
    samples: Vec<SampleMeta>,
    highlighter: Arc<SyntaxHighlighter>,
    warnings: Vec<String>,
}

impl SampleProcessor {
    #[must_use]
    pub fn for_chapter(chapter: &Chapter, highlighter: Arc<SyntaxHighlighter>) -> Self {
        Self {
            chapter: chapter.path.display().to_string(),
            samples: chapter
                .samples()
                .map(|sample| SampleMeta {
                    directive: sample.directive,
                    hidden_lines: sample.hidden_lines,
                })
                .collect(),
            highlighter,
            warnings: Vec::new(),
        }
    }
}

impl CodeBlockProcessor for SampleProcessor {
    fn process(&mut self, block: &CodeBlock<'_>) -> ProcessResult {
        let Some(meta) = self.samples.get(block.index).copied() else {
            return ProcessResult::PassThrough;
        };

        let source = if meta.hidden_lines {
            tome_book::display_source(block.source)
        } else {
            block.source.to_owned()
        };

        let highlighted = self.highlighter.highlight(block.language, &source);
        if !highlighted.matched && !PLAIN_LANGUAGES.contains(&block.language) {
            self.warnings.push(format!(
                "{}: sample #{}: no syntax definition for `{}`, rendered as plain text",
                self.chapter,
                block.index + 1,
                block.language
            ));
        }

        let mut html = String::with_capacity(highlighted.html.len() + 96);
        let _ = write!(
            html,
            "<div class=\"sample sample-{}\">",
            meta.directive.as_str()
        );
        if let Some(badge) = badge(meta.directive) {
            let _ = write!(html, "<span class=\"sample-badge\">{badge}</span>");
        }
        html.push_str(&highlighted.html);
        html.push_str("</div>");
        ProcessResult::Inline(html)
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn badge(directive: Directive) -> Option<&'static str> {
    match directive {
        Directive::CompileFail => Some("does not compile"),
        Directive::BuildOnly => Some("not run"),
        Directive::Run | Directive::Ignore => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tome_book::{CodeSample, ContentBlock};
    use tome_renderer::{HtmlBackend, MarkdownRenderer};

    fn sample(index: usize, language: &str, directive: Directive, source: &str) -> ContentBlock {
        ContentBlock::Code(CodeSample {
            index,
            line: 1,
            language: language.to_owned(),
            directive,
            attrs: std::collections::HashMap::new(),
            source: source.to_owned(),
            hidden_lines: language == "rust",
        })
    }

    fn chapter(markdown: &str, blocks: Vec<ContentBlock>) -> Chapter {
        Chapter {
            path: PathBuf::from("01-intro.md"),
            title: "Intro".to_owned(),
            position: 1,
            markdown: markdown.to_owned(),
            blocks,
        }
    }

    fn render(chapter: &Chapter) -> (String, Vec<String>) {
        let highlighter = Arc::new(SyntaxHighlighter::new());
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_processor(SampleProcessor::for_chapter(chapter, highlighter))
            .render_markdown(&chapter.markdown);
        (result.html, result.warnings)
    }

    #[test]
    fn test_directive_becomes_css_class() {
        let markdown = "```rust,compile_fail\nlet x: i32 = \"no\";\n```\n";
        let ch = chapter(
            markdown,
            vec![sample(0, "rust", Directive::CompileFail, "let x: i32 = \"no\";\n")],
        );
        let (html, warnings) = render(&ch);
        assert!(html.contains(r#"<div class="sample sample-compile-fail">"#));
        assert!(html.contains("does not compile"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_hidden_lines_are_not_displayed() {
        let source = "# let hidden_marker = 1;\nlet shown = 2;\n";
        let markdown = format!("```rust\n{source}```\n");
        let ch = chapter(&markdown, vec![sample(0, "rust", Directive::Run, source)]);
        let (html, _) = render(&ch);
        assert!(html.contains("sample-run"));
        assert!(html.contains("shown"));
        assert!(!html.contains("hidden_marker"));
        assert!(!html.contains("sample-badge"));
    }

    #[test]
    fn test_unknown_language_warns() {
        let markdown = "```klingon\nqapla'\n```\n";
        let ch = chapter(
            markdown,
            vec![sample(0, "klingon", Directive::Ignore, "qapla'\n")],
        );
        let (html, warnings) = render(&ch);
        assert!(html.contains("sample-ignore"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("`klingon`"));
    }

    #[test]
    fn test_plain_text_does_not_warn() {
        let markdown = "```\nplain\n```\n";
        let ch = chapter(markdown, vec![sample(0, "", Directive::Ignore, "plain\n")]);
        let (_, warnings) = render(&ch);
        assert!(warnings.is_empty());
    }
}
