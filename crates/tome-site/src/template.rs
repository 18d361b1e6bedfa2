//! HTML page templates for the static book.
//!
//! Every page shares one layout: a sidebar listing all chapters in reading
//! order, the article, previous/next links and an "On this page" outline.
//! All links are relative so the output can be served from any prefix.

use std::fmt::Write;

use tome_renderer::escape_html as escape;

/// A chapter entry in the sidebar.
pub struct NavItemData {
    pub title: String,
    /// Link relative to the current page.
    pub path: String,
    pub position: u32,
    pub is_active: bool,
}

/// Link to a neighbouring page.
pub struct PageLink {
    pub title: String,
    pub path: String,
}

/// Data for a table of contents entry.
pub struct TocData {
    pub level: u8,
    pub title: String,
    pub id: String,
}

/// All data needed to render a page.
pub struct PageData {
    pub title: String,
    pub book_title: String,
    /// `lang` attribute of the document.
    pub language: String,
    pub html_content: String,
    pub toc: Vec<TocData>,
    pub navigation: Vec<NavItemData>,
    pub previous: Option<PageLink>,
    pub next: Option<PageLink>,
    /// Relative link to the index page.
    pub home_path: String,
    /// Relative links to stylesheets, in load order.
    pub stylesheets: Vec<String>,
}

/// Render a complete HTML page.
pub fn render_page(page: &PageData) -> String {
    let mut html = String::with_capacity(8192);

    let _ = writeln!(
        html,
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>",
        escape(&page.language)
    );
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if page.title == page.book_title {
        let _ = writeln!(html, "<title>{}</title>", escape(&page.title));
    } else {
        let _ = writeln!(
            html,
            "<title>{} - {}</title>",
            escape(&page.title),
            escape(&page.book_title)
        );
    }
    for stylesheet in &page.stylesheets {
        let _ = writeln!(html, "<link rel=\"stylesheet\" href=\"{}\">", escape(stylesheet));
    }
    html.push_str("</head>\n<body>\n<div class=\"layout\">\n");

    render_sidebar(&mut html, page);

    html.push_str("<div class=\"content\">\n<main>\n<article class=\"chapter\">\n");
    html.push_str(&page.html_content);
    html.push_str("\n</article>\n");
    render_pager(&mut html, page.previous.as_ref(), page.next.as_ref());
    html.push_str("</main>\n");

    render_toc(&mut html, &page.toc);

    html.push_str("</div>\n</div>\n</body>\n</html>\n");
    html
}

fn render_sidebar(html: &mut String, page: &PageData) {
    html.push_str("<aside class=\"sidebar\">\n");
    let _ = writeln!(
        html,
        "<a href=\"{}\" class=\"book-title\">{}</a>",
        escape(&page.home_path),
        escape(&page.book_title)
    );
    html.push_str("<nav>\n<ol class=\"chapters\">\n");
    for item in &page.navigation {
        let class = if item.is_active {
            "chapter-link active"
        } else {
            "chapter-link"
        };
        let current = if item.is_active {
            " aria-current=\"page\""
        } else {
            ""
        };
        let _ = writeln!(
            html,
            "<li value=\"{}\"><a href=\"{}\" class=\"{}\"{}>{}</a></li>",
            item.position,
            escape(&item.path),
            class,
            current,
            escape(&item.title),
        );
    }
    html.push_str("</ol>\n</nav>\n</aside>\n");
}

fn render_pager(html: &mut String, previous: Option<&PageLink>, next: Option<&PageLink>) {
    if previous.is_none() && next.is_none() {
        return;
    }
    html.push_str("<nav class=\"pager\">\n");
    if let Some(link) = previous {
        let _ = writeln!(
            html,
            "<a href=\"{}\" class=\"pager-previous\" rel=\"prev\">&larr; {}</a>",
            escape(&link.path),
            escape(&link.title),
        );
    }
    if let Some(link) = next {
        let _ = writeln!(
            html,
            "<a href=\"{}\" class=\"pager-next\" rel=\"next\">{} &rarr;</a>",
            escape(&link.path),
            escape(&link.title),
        );
    }
    html.push_str("</nav>\n");
}

fn render_toc(html: &mut String, toc: &[TocData]) {
    if toc.is_empty() {
        return;
    }
    html.push_str("<aside class=\"toc\">\n<h3>On this page</h3>\n<ul>\n");
    for entry in toc {
        let indent = if entry.level >= 3 { " class=\"nested\"" } else { "" };
        let _ = writeln!(
            html,
            "<li{}><a href=\"#{}\">{}</a></li>",
            indent,
            escape(&entry.id),
            escape(&entry.title),
        );
    }
    html.push_str("</ul>\n</aside>\n");
}

/// Render the body of the index page: the description and the chapter list.
pub fn render_index_content(
    book_title: &str,
    description: Option<&str>,
    chapters: &[NavItemData],
) -> String {
    let mut html = String::with_capacity(1024);
    let _ = writeln!(html, "<h1>{}</h1>", escape(book_title));
    if let Some(description) = description {
        let _ = writeln!(html, "<p class=\"description\">{}</p>", escape(description));
    }
    html.push_str("<ol class=\"contents\">\n");
    for chapter in chapters {
        let _ = writeln!(
            html,
            "<li value=\"{}\"><a href=\"{}\">{}</a></li>",
            chapter.position,
            escape(&chapter.path),
            escape(&chapter.title),
        );
    }
    html.push_str("</ol>");
    html
}
