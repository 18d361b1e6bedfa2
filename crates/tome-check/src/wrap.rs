//! Implicit `main` for Rust samples.

/// Wrap a sample that has no `fn main` in one.
///
/// Leading crate attributes (`#![...]`) stay at the top of the file so they
/// still apply to the crate.
#[must_use]
pub fn wrap_main(source: &str) -> String {
    if source.contains("fn main") {
        return source.to_owned();
    }

    let mut attrs = String::new();
    let mut body = String::new();
    let mut in_header = true;
    for line in source.lines() {
        if in_header && (line.trim_start().starts_with("#![") || line.trim().is_empty()) {
            if !line.trim().is_empty() {
                attrs.push_str(line.trim_start());
                attrs.push('\n');
            }
            continue;
        }
        in_header = false;
        body.push_str(line);
        body.push('\n');
    }

    format!("#![allow(unused)]\n{attrs}fn main() {{\n{body}}}\n")
}
