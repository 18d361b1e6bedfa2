//! Render backend trait for output-specific rendering.

use std::borrow::Cow;

/// Backend trait for output-specific rendering operations.
///
/// The generic renderer handles lists, tables and inline formatting itself
/// and delegates the elements whose markup differs between outputs.
pub trait RenderBackend {
    /// Render a code block that no processor claimed and no highlighter is set for.
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    /// Render blockquote start tag.
    fn blockquote_start(out: &mut String);

    /// Render blockquote end tag.
    fn blockquote_end(out: &mut String);

    /// Render an image.
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Transform a link URL.
    ///
    /// Default implementation returns the URL unchanged.
    #[must_use]
    fn transform_link(url: &str) -> Cow<'_, str> {
        Cow::Borrowed(url)
    }

    /// Render a hard break.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    /// Render a horizontal rule.
    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Render a task list marker.
    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}
