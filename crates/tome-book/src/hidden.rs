//! Hidden sample lines.
//!
//! A line whose first non-blank characters are `# ` (or a lone `#`) is part
//! of the compiled program but not of the displayed sample. `##` escapes a
//! literal leading `#`. Attributes like `#[derive(Debug)]` and `#![allow]`
//! are never hidden.

enum Line {
    Hidden(String),
    Shown(String),
}

fn classify(line: &str) -> Line {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if trimmed == "#" {
        return Line::Hidden(indent.to_owned());
    }
    if let Some(rest) = trimmed.strip_prefix("# ") {
        return Line::Hidden(format!("{indent}{rest}"));
    }
    if let Some(rest) = trimmed.strip_prefix("##") {
        return Line::Shown(format!("{indent}#{rest}"));
    }
    Line::Shown(line.to_owned())
}

/// Source as displayed to readers: hidden lines removed, escapes resolved.
#[must_use]
pub fn display_source(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        if let Line::Shown(text) = classify(line) {
            out.push_str(&text);
            out.push('\n');
        }
    }
    out
}

/// Source as compiled: hidden markers removed, every line kept.
#[must_use]
pub fn compile_source(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        match classify(line) {
            Line::Hidden(text) | Line::Shown(text) => out.push_str(&text),
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "# use std::fmt;\n#\nfn main() {\n    # let hidden = 1;\n    println!(\"hi\");\n}\n";

    #[test]
    fn test_display_drops_hidden_lines() {
        assert_eq!(
            display_source(SAMPLE),
            "fn main() {\n    println!(\"hi\");\n}\n"
        );
    }

    #[test]
    fn test_compile_keeps_hidden_lines() {
        assert_eq!(
            compile_source(SAMPLE),
            "use std::fmt;\n\nfn main() {\n    let hidden = 1;\n    println!(\"hi\");\n}\n"
        );
    }

    #[test]
    fn test_attributes_are_not_hidden() {
        let src = "#[derive(Debug)]\nstruct Point;\n#![allow(unused)]\n";
        assert_eq!(display_source(src), src);
        assert_eq!(compile_source(src), src);
    }

    #[test]
    fn test_double_hash_escapes() {
        let src = "let s = r\"\n## not hidden\n\";\n";
        assert_eq!(display_source(src), "let s = r\"\n# not hidden\n\";\n");
        assert_eq!(compile_source(src), "let s = r\"\n# not hidden\n\";\n");
    }
}
