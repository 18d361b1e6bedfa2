//! HTML backend for static book pages.

use std::borrow::Cow;
use std::fmt::Write;

use crate::backend::RenderBackend;
use crate::state::escape_html;

/// HTML render backend.
///
/// Produces semantic HTML5 with `<pre><code>` code blocks and rewrites links
/// to chapter sources (`*.md`) into links to their rendered pages (`*.html`).
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
        }
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        write!(
            out,
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
    }

    fn transform_link(url: &str) -> Cow<'_, str> {
        rewrite_md_link(url)
    }
}

/// Rewrite a link to a Markdown chapter into a link to its HTML page.
///
/// - `traits.md` -> `traits.html`
/// - `../basics/intro.md#setup` -> `../basics/intro.html#setup`
///
/// External links, fragment-only links and other files are returned unchanged.
#[allow(clippy::case_sensitive_file_extension_comparisons)]
fn rewrite_md_link(url: &str) -> Cow<'_, str> {
    if url.contains("://") || url.starts_with("//") || url.starts_with("mailto:") {
        return Cow::Borrowed(url);
    }

    let (path, fragment) = match url.find('#') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };

    match path.strip_suffix(".md") {
        Some(stem) if !stem.is_empty() => Cow::Owned(format!("{stem}.html{fragment}")),
        _ => Cow::Borrowed(url),
    }
}
