//! Quire Parser Library
//!
//! Markdown rendering, fenced block renderers and syntax highlighting.

pub mod fence;
pub mod markdown;
pub mod syntax;

use std::path::Path;

pub use fence::{DiagramFence, FenceRenderer, FencedBlock, PlainFence};
pub use markdown::{MarkdownRenderer, ParsedMarkdown, RenderedMarkdown};
pub use syntax::SyntaxHighlighter;
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Markdown parsing error.
    #[error("markdown error: {0}")]
    Markdown(#[from] markdown::MarkdownError),

    /// Unknown file extension.
    #[error("unknown file extension: {0}")]
    UnknownExtension(String),
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Trait for content parsers.
pub trait ContentParser: Send + Sync {
    /// Whether this parser handles files with the given extension.
    fn accepts(&self, extension: &str) -> bool;

    /// Parse content from a string and file path.
    fn parse(&self, content: &str, path: &Path) -> Result<ParsedMarkdown>;
}

impl ContentParser for MarkdownRenderer {
    fn accepts(&self, extension: &str) -> bool {
        matches!(extension.to_ascii_lowercase().as_str(), "md" | "markdown")
    }

    fn parse(&self, content: &str, path: &Path) -> Result<ParsedMarkdown> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ParserError::UnknownExtension("(none)".to_string()))?;

        if !self.accepts(ext) {
            return Err(ParserError::UnknownExtension(ext.to_string()));
        }

        Ok(MarkdownRenderer::parse(self, content, path)?)
    }
}
