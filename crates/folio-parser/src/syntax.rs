//! Syntax highlighting for fenced code blocks.

use syntect::{highlighting::ThemeSet, html::highlighted_html_for_string, parsing::SyntaxSet};
use tracing::debug;

/// Syntax highlighter using syntect.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    default_theme: String,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("base16-ocean.dark")
    }
}

impl SyntaxHighlighter {
    /// Create a new syntax highlighter with the specified theme.
    pub fn new(theme: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            default_theme: theme.to_string(),
        }
    }

    /// Render a code block.
    ///
    /// Blocks with a recognized language are highlighted; an unknown language
    /// keeps a `language-*` class so client-side highlighters can pick it up,
    /// and blocks without a language are emitted as plain `<pre><code>`.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let Some(lang) = lang else {
            return plain_block(code, None);
        };

        let syntax = self.syntax_set.find_syntax_by_token(lang);
        let theme = self
            .theme_set
            .themes
            .get(&self.default_theme)
            .or_else(|| self.theme_set.themes.values().next());

        match (syntax, theme) {
            (Some(syntax), Some(theme)) => {
                match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
                    Ok(html) => html,
                    Err(e) => {
                        debug!(lang, error = %e, "highlighting failed, emitting plain block");
                        plain_block(code, Some(lang))
                    }
                }
            }
            _ => plain_block(code, Some(lang)),
        }
    }

    /// Set the default theme. Unknown names are ignored.
    pub fn set_theme(&mut self, theme: &str) {
        if self.theme_set.themes.contains_key(theme) {
            self.default_theme = theme.to_string();
        } else {
            debug!(theme, "unknown syntax theme, keeping {}", self.default_theme);
        }
    }

    /// Current theme name.
    pub fn theme(&self) -> &str {
        &self.default_theme
    }
}

fn plain_block(code: &str, lang: Option<&str>) -> String {
    let lang_class = lang
        .map(|l| format!(" class=\"language-{}\"", html_escape(l)))
        .unwrap_or_default();
    format!("<pre><code{lang_class}>{}</code></pre>\n", html_escape(code))
}

/// Escape HTML special characters.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
