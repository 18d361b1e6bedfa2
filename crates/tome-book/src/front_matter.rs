//! YAML front matter.
//!
//! ```text
//! ---
//! title: Display formatting
//! position: 2
//! ---
//! ```

use serde::Deserialize;

/// Fields read from a chapter's front matter.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FrontMatter {
    pub title: Option<String>,
    /// Kept untyped so a bad value can be reported verbatim.
    pub position: Option<serde_yaml::Value>,
}

/// Front matter split from the chapter body.
pub(crate) struct Split<'a> {
    /// Raw YAML between the delimiters, if present.
    pub yaml: Option<&'a str>,
    pub body: &'a str,
    /// Number of lines consumed by the front matter block.
    pub line_offset: usize,
}

/// Split a leading `---` block from `content`.
///
/// Content without a closing delimiter is treated as having no front matter.
pub(crate) fn split(content: &str) -> Split<'_> {
    let none = Split {
        yaml: None,
        body: content,
        line_offset: 0,
    };

    let content_start = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = content_start
        .strip_prefix("---\n")
        .or_else(|| content_start.strip_prefix("---\r\n"))
    else {
        return none;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Split {
                yaml: Some(yaml),
                body,
                line_offset: yaml.lines().count() + 2,
            };
        }
        offset += line.len();
    }

    none
}

/// Parse the YAML of a front matter block.
pub(crate) fn parse(yaml: &str) -> Result<FrontMatter, String> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| e.to_string())
}

/// Render a YAML scalar for error messages.
pub(crate) fn describe(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_owned())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}
