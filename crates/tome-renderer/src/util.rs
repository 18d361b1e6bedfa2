//! Shared utility functions for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Compute a relative URL from one page to another (RFC 3986).
///
/// Both paths are relative to the site root, without leading slash. The last
/// segment of `from` is the current document; its base directory is
/// everything before it.
///
/// # Examples
///
/// ```
/// use tome_renderer::relative_path;
///
/// assert_eq!(relative_path("basics/intro.html", "basics/traits.html"), "traits.html");
/// assert_eq!(relative_path("basics/intro.html", "index.html"), "../index.html");
/// assert_eq!(relative_path("index.html", "basics/intro.html"), "basics/intro.html");
/// ```
#[must_use]
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let from_dir = if from.ends_with('/') || from_segs.is_empty() {
        &from_segs[..]
    } else {
        &from_segs[..from_segs.len() - 1]
    };

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = "../".repeat(from_dir.len() - common);
    let result = format!("{ups}{}", to_segs[common..].join("/"));
    if result.is_empty() {
        "./".to_owned()
    } else {
        result
    }
}

#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
