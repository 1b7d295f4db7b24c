//! Fenced code block rendering.
//!
//! Renderers form a chain: a wrapper handles the blocks it recognises and
//! hands everything else to the renderer it replaced.

/// A fenced code block as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Info string after the opening fence, e.g. `rust` or `mermaid Flow`.
    pub info: &'a str,

    /// Raw block content.
    pub content: &'a str,
}

impl FencedBlock<'_> {
    /// First word of the info string.
    pub fn lang(&self) -> Option<&str> {
        self.info.split_whitespace().next()
    }
}

/// Renders one fenced block to HTML.
pub trait FenceRenderer: Send + Sync {
    fn render(&self, block: &FencedBlock<'_>) -> String;
}

/// Escaped `<pre><code>` output with no highlighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFence;

impl FenceRenderer for PlainFence {
    fn render(&self, block: &FencedBlock<'_>) -> String {
        let lang_class = block
            .lang()
            .map(|l| format!(" class=\"language-{}\"", escape_html(l)))
            .unwrap_or_default();
        format!(
            "<pre><code{lang_class}>{}</code></pre>\n",
            escape_html(block.content)
        )
    }
}

/// Renders blocks whose info string starts with a marker as client-side
/// diagrams, deferring all other blocks to `fallback`.
pub struct DiagramFence {
    marker: String,
    fallback: Box<dyn FenceRenderer>,
}

impl DiagramFence {
    pub fn new(marker: impl Into<String>, fallback: Box<dyn FenceRenderer>) -> Self {
        Self {
            marker: marker.into(),
            fallback,
        }
    }
}

impl std::fmt::Debug for DiagramFence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramFence")
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl FenceRenderer for DiagramFence {
    fn render(&self, block: &FencedBlock<'_>) -> String {
        let Some(after_marker) = block.info.strip_prefix(self.marker.as_str()) else {
            return self.fallback.render(block);
        };

        // One separator character sits between the marker and the caption.
        let mut rest = after_marker.chars();
        rest.next();
        let caption = rest.as_str().replace('"', "&quot;");

        let code = block.content.trim();
        let code = serde_json::to_string(code)
            .unwrap_or_else(|_| String::from("\"\""))
            .replace('"', "&quot;");

        format!(r#"<ClientOnly><Mermaid :value="{code}" caption="{caption}" /></ClientOnly>"#)
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
