//! Syntax highlighting for code blocks.

use syntect::{
    highlighting::ThemeSet, html::highlighted_html_for_string, parsing::SyntaxSet,
};
use tracing::debug;

use crate::fence::{FenceRenderer, FencedBlock, PlainFence};

/// Syntax highlighter using syntect. The default fence renderer.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("base16-ocean.dark")
    }
}

impl SyntaxHighlighter {
    /// Create a highlighter with the given theme.
    ///
    /// Unknown theme names fall back to the first bundled theme.
    pub fn new(theme: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        if !theme_set.themes.contains_key(theme) {
            debug!(theme, "unknown syntax theme, using the first bundled theme");
        }

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme: theme.to_string(),
        }
    }

    /// Get available theme names.
    pub fn available_themes(&self) -> Vec<&str> {
        self.theme_set.themes.keys().map(String::as_str).collect()
    }

    /// Highlight code in the given language.
    ///
    /// Unrecognised languages are highlighted as plain text.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = lang
            .and_then(|l| self.syntax_set.find_syntax_by_token(l))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(html) => html,
            None => PlainFence.render(&FencedBlock {
                info: lang.unwrap_or_default(),
                content: code,
            }),
        }
    }
}

impl FenceRenderer for SyntaxHighlighter {
    fn render(&self, block: &FencedBlock<'_>) -> String {
        self.highlight(block.content, block.lang())
    }
}
