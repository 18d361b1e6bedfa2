//! Class-based syntax highlighting with syntect.

use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::state::escape_html;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Theme used for the generated stylesheet.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Highlighted code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    /// `<pre><code>` markup.
    pub html: String,
    /// Whether a grammar matched the language; `false` means plain text.
    pub matched: bool,
}

/// Highlights code into HTML spans carrying `hl-` prefixed classes.
///
/// Loading the syntax set is expensive; build one highlighter and share it.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
}

impl SyntaxHighlighter {
    /// Create a highlighter with syntect's bundled grammars.
    #[must_use]
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Render `code` as a `<pre><code>` block.
    ///
    /// Unknown or empty languages render as escaped plain text.
    #[must_use]
    pub fn highlight(&self, language: &str, code: &str) -> Highlighted {
        let token = if language.is_empty() { "text" } else { language };
        let syntax = self.find_syntax(token);
        let matched = syntax.is_some();
        let syntax = syntax.unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut source = code.to_owned();
        if !source.ends_with('\n') {
            source.push('\n');
        }

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        let mut failed = false;
        for line in LinesWithEndings::from(source.as_str()) {
            if generator
                .parse_html_for_line_which_includes_newline(line)
                .is_err()
            {
                failed = true;
                break;
            }
        }
        let body = if failed {
            escape_html(&source)
        } else {
            generator.finalize()
        };

        let lang = escape_html(&token.to_ascii_lowercase());
        Highlighted {
            html: format!(
                r#"<pre class="highlight"><code class="language-{lang}">{body}</code></pre>"#
            ),
            matched: matched && !failed,
        }
    }

    fn find_syntax(&self, token: &str) -> Option<&SyntaxReference> {
        let lowercase = token.to_ascii_lowercase();
        self.syntax_set
            .find_syntax_by_token(&lowercase)
            .or_else(|| self.syntax_set.find_syntax_by_name(token))
            .or_else(|| self.syntax_set.find_syntax_by_extension(&lowercase))
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Stylesheet for highlighted code using one of syntect's bundled themes.
///
/// Returns `None` when the theme does not exist.
#[must_use]
pub fn highlight_css(theme: &str) -> Option<String> {
    let themes = ThemeSet::load_defaults();
    let theme = themes.themes.get(theme)?;
    css_for_theme_with_class_style(theme, CLASS_STYLE).ok()
}
