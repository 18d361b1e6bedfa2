//! Markdown to HTML rendering for Tome books.
//!
//! A generic [`MarkdownRenderer`] walks pulldown-cmark events and delegates
//! output-specific markup to a [`RenderBackend`]; [`HtmlBackend`] produces
//! the static pages. Fenced code blocks can be claimed by a
//! [`CodeBlockProcessor`] or highlighted by a shared [`SyntaxHighlighter`].
//!
//! # Example
//!
//! ```
//! use tome_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let result = MarkdownRenderer::<HtmlBackend>::new()
//!     .with_title_extraction()
//!     .render_markdown("# Traits\n\nSee [generics](generics.md).");
//! assert_eq!(result.title.as_deref(), Some("Traits"));
//! assert!(result.html.contains(r#"href="generics.html""#));
//! ```

mod backend;
mod code_block;
mod highlight;
mod html;
mod renderer;
mod state;
mod util;

pub use backend::RenderBackend;
pub use code_block::{CodeBlock, CodeBlockProcessor, ProcessResult};
pub use highlight::{DEFAULT_THEME, Highlighted, SyntaxHighlighter, highlight_css};
pub use html::HtmlBackend;
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html, slugify};
pub use util::relative_path;
