//! Markdown rendering using pulldown-cmark.
//!
//! The event stream is collected and rewritten before it reaches
//! `push_html`: fenced blocks go through the [`FenceRenderer`] chain,
//! headings gain anchors and feed the page's header tree, math is emitted as
//! KaTeX auto-render markup, and abbreviation definitions become `<abbr>`
//! wrappers.

use std::{borrow::Cow, collections::HashMap, path::Path};

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use quire_core::{
    Frontmatter, PageHeader, config::MarkdownConfig, frontmatter::parse_frontmatter,
};
use regex::Regex;
use thiserror::Error;
use tracing::trace;

use crate::{
    fence::{FenceRenderer, FencedBlock, PlainFence, escape_html},
    syntax::SyntaxHighlighter,
};

/// Markdown parsing errors.
#[derive(Debug, Error)]
pub enum MarkdownError {
    /// Failed to parse frontmatter.
    #[error("frontmatter error: {0}")]
    Frontmatter(#[from] quire_core::CoreError),
}

/// Result type for markdown operations.
pub type Result<T> = std::result::Result<T, MarkdownError>;

/// Output of rendering a Markdown body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMarkdown {
    pub html: String,

    /// h2 headings with their h3 children.
    pub headers: Vec<PageHeader>,

    /// Text of the first h1.
    pub title: Option<String>,
}

/// A Markdown file split into frontmatter and rendered body.
#[derive(Debug, Clone)]
pub struct ParsedMarkdown {
    pub frontmatter: Frontmatter,
    pub body: String,
    pub rendered: RenderedMarkdown,
}

/// Markdown renderer with a pluggable fence renderer chain.
pub struct MarkdownRenderer {
    options: Options,
    abbreviations: bool,
    fence: Box<dyn FenceRenderer>,
}

impl std::fmt::Debug for MarkdownRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownRenderer")
            .field("options", &self.options)
            .field("abbreviations", &self.abbreviations)
            .finish_non_exhaustive()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a renderer with every extension enabled.
    pub fn new() -> Self {
        Self::from_config(&MarkdownConfig::default())
    }

    /// Create a renderer from the `[markdown]` configuration.
    pub fn from_config(config: &MarkdownConfig) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        if config.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if config.math {
            options.insert(Options::ENABLE_MATH);
        }

        Self {
            options,
            abbreviations: config.abbreviations,
            fence: Box::new(SyntaxHighlighter::new(&config.syntax_theme)),
        }
    }

    /// Replace the fence renderer.
    #[must_use]
    pub fn with_fence(mut self, fence: Box<dyn FenceRenderer>) -> Self {
        self.fence = fence;
        self
    }

    /// Wrap the current fence renderer; `wrap` receives the previous one as
    /// its fallback.
    pub fn wrap_fence<F>(&mut self, wrap: F)
    where
        F: FnOnce(Box<dyn FenceRenderer>) -> Box<dyn FenceRenderer>,
    {
        let previous = std::mem::replace(&mut self.fence, Box::new(PlainFence));
        self.fence = wrap(previous);
    }

    /// Split frontmatter and render the body.
    pub fn parse(&self, content: &str, path: &Path) -> Result<ParsedMarkdown> {
        let (frontmatter, body) = parse_frontmatter(content, path)?;
        let rendered = self.render(&body);

        Ok(ParsedMarkdown {
            frontmatter,
            body,
            rendered,
        })
    }

    /// Render a Markdown body to HTML, collecting headings.
    pub fn render(&self, body: &str) -> RenderedMarkdown {
        let (source, abbreviations) = if self.abbreviations {
            extract_abbreviations(body)
        } else {
            (Cow::Borrowed(body), Vec::new())
        };

        let mut events: Vec<Event<'_>> = Vec::new();
        let mut headers: Vec<PageHeader> = Vec::new();
        let mut title = None;
        let mut slugs: HashMap<String, usize> = HashMap::new();

        let mut heading: Option<HeadingState<'_>> = None;
        let mut code: Option<(String, String)> = None;

        for event in Parser::new_ext(&source, self.options) {
            if let Some((info, content)) = code.as_mut() {
                match event {
                    Event::Text(text) => content.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let html = self.fence.render(&FencedBlock {
                            info: info.as_str(),
                            content: content.as_str(),
                        });
                        events.push(Event::Html(html.into()));
                        code = None;
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let info = match kind {
                        CodeBlockKind::Fenced(info) => info.to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    code = Some((info, String::new()));
                }
                Event::Start(Tag::Heading { level, id, .. }) => {
                    heading = Some(HeadingState {
                        level,
                        id: id.map(|i| i.to_string()),
                        text: String::new(),
                        events: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    let Some(state) = heading.take() else {
                        continue;
                    };
                    let level = state.level as u8;
                    let slug = unique_slug(
                        &mut slugs,
                        state.id.unwrap_or_else(|| slugify(&state.text)),
                    );

                    let id = escape_html(&slug);
                    events.push(Event::Html(format!("<h{level} id=\"{id}\">").into()));
                    events.extend(state.events);
                    if level >= 2 {
                        events.push(Event::Html(
                            format!(
                                " <a class=\"header-anchor\" href=\"#{id}\" aria-hidden=\"true\">#</a>"
                            )
                            .into(),
                        ));
                    }
                    events.push(Event::Html(format!("</h{level}>\n").into()));

                    let text = state.text.trim();
                    match level {
                        1 if title.is_none() => title = Some(text.to_string()),
                        2 => headers.push(PageHeader::new(2, escape_title(text), slug)),
                        3 => {
                            let header = PageHeader::new(3, escape_title(text), slug);
                            match headers.last_mut() {
                                Some(parent) => parent.children.push(header),
                                None => headers.push(header),
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(text) => {
                    if let Some(state) = heading.as_mut() {
                        state.text.push_str(&text);
                    }
                    emit(&mut heading, &mut events, Event::Text(text));
                }
                Event::Code(text) => {
                    if let Some(state) = heading.as_mut() {
                        state.text.push_str(&text);
                    }
                    emit(&mut heading, &mut events, Event::Code(text));
                }
                Event::InlineMath(math) => {
                    let html = format!(
                        "<span class=\"math inline\">\\({}\\)</span>",
                        escape_html(&math)
                    );
                    emit(&mut heading, &mut events, Event::InlineHtml(html.into()));
                }
                Event::DisplayMath(math) => {
                    let html = format!(
                        "<span class=\"math display\">\\[{}\\]</span>",
                        escape_html(&math)
                    );
                    emit(&mut heading, &mut events, Event::InlineHtml(html.into()));
                }
                other => emit(&mut heading, &mut events, other),
            }
        }

        if let Some(matcher) = AbbreviationMatcher::new(&abbreviations) {
            events = matcher.apply(events);
        }

        let mut html = String::with_capacity(source.len() * 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());

        trace!(headers = headers.len(), "rendered markdown");

        RenderedMarkdown {
            html,
            headers,
            title,
        }
    }
}

struct HeadingState<'a> {
    level: HeadingLevel,
    id: Option<String>,
    text: String,
    events: Vec<Event<'a>>,
}

fn emit<'a>(heading: &mut Option<HeadingState<'a>>, events: &mut Vec<Event<'a>>, event: Event<'a>) {
    match heading.as_mut() {
        Some(state) => state.events.push(event),
        None => events.push(event),
    }
}

/// Slugify text for use as an HTML id attribute.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_hyphen = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Suffix repeated slugs with `-1`, `-2`, ...
fn unique_slug(seen: &mut HashMap<String, usize>, slug: String) -> String {
    let count = seen.entry(slug.clone()).or_insert(0);
    let unique = if *count == 0 {
        slug
    } else {
        format!("{slug}-{count}")
    };
    *count += 1;
    unique
}

/// Header titles are stored in their rendered, entity-escaped form.
fn escape_title(text: &str) -> String {
    escape_html(text).replace('\'', "&#39;")
}

/// Remove `*[ABBR]: Definition` lines outside fenced blocks.
fn extract_abbreviations(body: &str) -> (Cow<'_, str>, Vec<(String, String)>) {
    let mut definitions = Vec::new();
    let mut kept = String::with_capacity(body.len());
    let mut in_fence = false;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }

        if !in_fence && let Some(definition) = parse_abbreviation(trimmed) {
            definitions.push(definition);
            continue;
        }
        kept.push_str(line);
    }

    if definitions.is_empty() {
        (Cow::Borrowed(body), definitions)
    } else {
        (Cow::Owned(kept), definitions)
    }
}

fn parse_abbreviation(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("*[")?;
    let (abbr, rest) = rest.split_once("]:")?;
    let abbr = abbr.trim();
    if abbr.is_empty() {
        return None;
    }
    Some((abbr.to_string(), rest.trim().to_string()))
}

struct AbbreviationMatcher {
    pattern: Regex,
    titles: HashMap<String, String>,
}

impl AbbreviationMatcher {
    fn new(definitions: &[(String, String)]) -> Option<Self> {
        if definitions.is_empty() {
            return None;
        }

        let titles: HashMap<String, String> = definitions.iter().cloned().collect();
        let mut keys: Vec<&String> = titles.keys().collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\b(?:{alternation})\b")).ok()?;

        Some(Self { pattern, titles })
    }

    fn apply<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            match event {
                Event::Text(text) if self.pattern.is_match(&text) => self.split(&text, &mut out),
                other => out.push(other),
            }
        }
        out
    }

    fn split<'a>(&self, text: &str, out: &mut Vec<Event<'a>>) {
        let mut last = 0;
        for m in self.pattern.find_iter(text) {
            if m.start() > last {
                out.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
            }
            let title = self.titles.get(m.as_str()).map(String::as_str).unwrap_or_default();
            out.push(Event::InlineHtml(
                format!(
                    "<abbr title=\"{}\">{}</abbr>",
                    escape_html(title),
                    escape_html(m.as_str())
                )
                .into(),
            ));
            last = m.end();
        }
        if last < text.len() {
            out.push(Event::Text(CowStr::from(text[last..].to_string())));
        }
    }
}
