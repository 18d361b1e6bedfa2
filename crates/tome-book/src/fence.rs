//! Fence info string parsing.
//!
//! Info strings follow the mdBook convention: the first token is the
//! language, further tokens are flags or `key=value` attributes, separated by
//! commas and/or whitespace.
//!
//! ```text
//! rust
//! rust,compile_fail
//! rust, no_run edition=2021
//! python title="example.py"
//! ```

use std::collections::HashMap;

/// Validation directive of a code sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Must compile and run successfully.
    Run,
    /// Must compile; not executed.
    BuildOnly,
    /// Must fail to compile.
    CompileFail,
    /// Not validated, illustrative only.
    Ignore,
}

impl Directive {
    /// Stable name used in CSS classes, cache keys and messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::BuildOnly => "no-run",
            Self::CompileFail => "compile-fail",
            Self::Ignore => "ignore",
        }
    }

    /// Whether a toolchain is invoked for this directive.
    #[must_use]
    pub fn is_validated(self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed fence info string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceInfo {
    /// Language tag, lowercased. Empty for bare fences.
    pub language: String,
    /// Directive requested by flags, before toolchain availability is known.
    pub directive: Directive,
    /// `key=value` attributes.
    pub attrs: HashMap<String, String>,
}

impl FenceInfo {
    /// Parse an info string.
    ///
    /// Later flags win over earlier ones; unknown flags are ignored so that
    /// mdBook-only flags such as `editable` or `edition2021` do not break.
    #[must_use]
    pub fn parse(info: &str) -> Self {
        let mut tokens = info
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty());
        let language = tokens.next().unwrap_or("").to_ascii_lowercase();

        let mut directive = Directive::Run;
        let mut attrs = HashMap::new();
        for token in tokens {
            if let Some((key, value)) = token.split_once('=') {
                let value = value.trim_matches('"').trim_matches('\'');
                attrs.insert(key.to_owned(), value.to_owned());
                continue;
            }
            match token {
                "compile_fail" => directive = Directive::CompileFail,
                "no_run" => directive = Directive::BuildOnly,
                "ignore" => directive = Directive::Ignore,
                _ => {}
            }
        }

        if language.is_empty() {
            directive = Directive::Ignore;
        }

        Self {
            language,
            directive,
            attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_only_runs() {
        let info = FenceInfo::parse("rust");
        assert_eq!(info.language, "rust");
        assert_eq!(info.directive, Directive::Run);
        assert!(info.attrs.is_empty());
    }

    #[test]
    fn test_compile_fail_flag() {
        let info = FenceInfo::parse("rust,compile_fail");
        assert_eq!(info.directive, Directive::CompileFail);
    }

    #[test]
    fn test_flags_with_spaces_and_commas() {
        let info = FenceInfo::parse("rust, no_run edition2021");
        assert_eq!(info.language, "rust");
        assert_eq!(info.directive, Directive::BuildOnly);
    }

    #[test]
    fn test_ignore_flag() {
        assert_eq!(FenceInfo::parse("rust,ignore").directive, Directive::Ignore);
    }

    #[test]
    fn test_last_flag_wins() {
        let info = FenceInfo::parse("rust,ignore,compile_fail");
        assert_eq!(info.directive, Directive::CompileFail);
    }

    #[test]
    fn test_attributes_are_collected() {
        let info = FenceInfo::parse("python title=\"demo.py\" theme='dark'");
        assert_eq!(info.language, "python");
        assert_eq!(info.attrs.get("title"), Some(&"demo.py".to_owned()));
        assert_eq!(info.attrs.get("theme"), Some(&"dark".to_owned()));
    }

    #[test]
    fn test_language_is_lowercased() {
        assert_eq!(FenceInfo::parse("Rust").language, "rust");
    }

    #[test]
    fn test_empty_info_is_ignored() {
        let info = FenceInfo::parse("");
        assert_eq!(info.language, "");
        assert_eq!(info.directive, Directive::Ignore);
    }

    #[test]
    fn test_directive_names() {
        assert_eq!(Directive::CompileFail.to_string(), "compile-fail");
        assert!(!Directive::Ignore.is_validated());
        assert!(Directive::BuildOnly.is_validated());
    }
}
