//! Code block processors.
//!
//! Processors are registered with the renderer and asked, in order, to render
//! each fenced code block. The first one returning [`ProcessResult::Inline`]
//! wins; when all pass, the block is highlighted (or handed to the backend).
//!
//! # Example
//!
//! ```
//! use tome_renderer::{CodeBlock, CodeBlockProcessor, ProcessResult};
//!
//! struct ConsoleProcessor;
//!
//! impl CodeBlockProcessor for ConsoleProcessor {
//!     fn process(&mut self, block: &CodeBlock<'_>) -> ProcessResult {
//!         if block.language == "console" {
//!             ProcessResult::Inline(format!("<pre class=\"console\">{}</pre>", block.source))
//!         } else {
//!             ProcessResult::PassThrough
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;

/// A fenced code block handed to processors.
#[derive(Debug)]
pub struct CodeBlock<'a> {
    /// Zero-based index among the page's fenced code blocks.
    pub index: usize,
    /// Language token, lowercased; empty for bare fences.
    pub language: &'a str,
    /// Full fence info string as written.
    pub info: &'a str,
    /// `key=value` attributes, as parsed by [`tome_book::FenceInfo`].
    pub attrs: &'a HashMap<String, String>,
    /// Literal block content.
    pub source: &'a str,
}

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the block with this HTML.
    Inline(String),
    /// Not handled by this processor.
    PassThrough,
}

/// Trait for custom code block rendering.
pub trait CodeBlockProcessor {
    /// Process a code block.
    fn process(&mut self, block: &CodeBlock<'_>) -> ProcessResult;

    /// Warnings generated during processing.
    ///
    /// Default implementation returns an empty slice.
    fn warnings(&self) -> &[String] {
        &[]
    }
}
