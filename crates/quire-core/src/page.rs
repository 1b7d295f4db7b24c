//! Page records and source path handling.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    frontmatter::{Frontmatter, parse_date},
    header::PageHeader,
};

/// Paths derived from a source file's location in the content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePath {
    /// Source path relative to the content root, `/`-separated.
    pub file_path_relative: String,

    /// Output path inferred from the source path.
    pub path_inferred: String,

    /// File stem without a leading `YYYY-MM-DD-` date.
    pub slug: String,

    /// Date taken from a `YYYY-MM-DD-` file name prefix.
    pub date: Option<NaiveDate>,
}

impl PagePath {
    /// Derive page paths from a content-relative source path.
    ///
    /// - `posts/hello.md` → `/posts/hello.html`
    /// - `posts/README.md` → `/posts/`
    /// - `README.md` → `/`
    /// - `posts/2024-01-26-hello.md` → slug `hello`, date 2024-01-26
    pub fn from_relative(relative: &str) -> Self {
        let file_path_relative = relative.replace('\\', "/").trim_start_matches('/').to_string();

        let without_ext = file_path_relative
            .strip_suffix(".md")
            .unwrap_or(&file_path_relative);
        let (dir, stem) = match without_ext.rsplit_once('/') {
            Some((dir, stem)) => (Some(dir), stem),
            None => (None, without_ext),
        };

        let is_index = stem.eq_ignore_ascii_case("readme") || stem.eq_ignore_ascii_case("index");
        let path_inferred = match (is_index, dir) {
            (true, Some(dir)) => format!("/{dir}/"),
            (true, None) => "/".to_string(),
            (false, _) => format!("/{without_ext}.html"),
        };

        let (date, slug) = split_date_prefix(stem);

        Self {
            file_path_relative: file_path_relative.clone(),
            path_inferred,
            slug: slug.to_string(),
            date,
        }
    }
}

/// Split a `YYYY-MM-DD-` prefix from a file stem.
fn split_date_prefix(stem: &str) -> (Option<NaiveDate>, &str) {
    let date = stem
        .get(..10)
        .filter(|_| stem.as_bytes().get(10) == Some(&b'-'))
        .and_then(parse_date);

    match date {
        Some(date) if stem.len() > 11 => (Some(date), &stem[11..]),
        _ => (None, stem),
    }
}

/// A rendered page as seen by hooks, caches, feeds and templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page title.
    pub title: String,

    /// Final output path (`permalink` when set, otherwise `path_inferred`).
    pub path: String,

    /// Explicit permalink from frontmatter.
    #[serde(default)]
    pub permalink: Option<String>,

    /// Output path inferred from the source location.
    #[serde(default)]
    pub path_inferred: Option<String>,

    /// Source path relative to the content root.
    #[serde(default)]
    pub file_path_relative: Option<String>,

    /// Open frontmatter map.
    #[serde(default)]
    pub frontmatter: Frontmatter,

    /// URL slug.
    #[serde(default)]
    pub slug: String,

    /// Publication date.
    #[serde(default)]
    pub date: Option<NaiveDate>,

    /// Heading tree.
    #[serde(default)]
    pub headers: Vec<PageHeader>,

    /// Rendered HTML content.
    #[serde(default)]
    pub content_rendered: String,

    /// Last modification time of the source file.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Page {
    /// Whether the page's source path starts with `prefix`.
    ///
    /// Pages without a source path never match.
    pub fn is_under(&self, prefix: &str) -> bool {
        self.file_path_relative
            .as_deref()
            .is_some_and(|p| p.starts_with(prefix))
    }

    /// Path used for canonical links: permalink, then inferred path, then path.
    pub fn canonical_path(&self) -> &str {
        self.permalink
            .as_deref()
            .or(self.path_inferred.as_deref())
            .unwrap_or(&self.path)
    }

    /// Plain-text summary of the page for meta descriptions.
    pub fn summary(&self, max_chars: usize) -> String {
        match self.frontmatter.description() {
            Some(description) => description.to_string(),
            None => truncate_at_word_boundary(strip_html(&self.content_rendered).trim(), max_chars),
        }
    }
}

/// A tag to emit in a page's `<head>`.
///
/// Frontmatter and configuration write these as `[tag, {attrs}]` or
/// `[tag, {attrs}, content]` arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadTag {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl HeadTag {
    /// Create a tag without content.
    pub fn new<K, V>(tag: impl Into<String>, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tag: tag.into(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            content: None,
        }
    }

    /// Set inner content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Parse a `[tag, {attrs}, content?]` value. Malformed entries yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let tag = items.first()?.as_str()?.to_string();

        let attrs = items
            .get(1)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| {
                        let v = match v {
                            Value::String(s) => s.clone(),
                            Value::Bool(true) => String::new(),
                            Value::Number(n) => n.to_string(),
                            _ => return None,
                        };
                        Some((k.clone(), v))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let content = items.get(2).and_then(Value::as_str).map(str::to_string);

        Some(Self { tag, attrs, content })
    }

    /// Convert to the `[tag, {attrs}]` frontmatter form.
    pub fn to_value(&self) -> Value {
        let mut items = vec![
            Value::String(self.tag.clone()),
            Value::Object(
                self.attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        ];
        if let Some(content) = &self.content {
            items.push(Value::String(content.clone()));
        }
        Value::Array(items)
    }

    /// Render as HTML.
    pub fn render(&self) -> String {
        let mut html = format!("<{}", self.tag);
        for (key, value) in &self.attrs {
            if value.is_empty() {
                html.push_str(&format!(" {key}"));
            } else {
                html.push_str(&format!(" {key}=\"{}\"", escape_attr(value)));
            }
        }
        html.push('>');

        match (&self.content, is_void_element(&self.tag)) {
            (Some(content), _) => html.push_str(&format!("{content}</{}>", self.tag)),
            (None, false) => html.push_str(&format!("</{}>", self.tag)),
            (None, true) => {}
        }

        html
    }
}

fn is_void_element(tag: &str) -> bool {
    matches!(tag, "meta" | "link" | "base")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Strip HTML tags from content.
fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Truncate text at word boundary, respecting UTF-8 character boundaries.
fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        return text.to_string();
    }

    let truncate_byte_idx = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());

    let truncated = &text[..truncate_byte_idx];

    if let Some(last_space_byte) = truncated.rfind(' ') {
        format!("{}...", &truncated[..last_space_byte])
    } else {
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_page_path_simple() {
        let pp = PagePath::from_relative("projects/git-tool.md");
        assert_eq!(pp.file_path_relative, "projects/git-tool.md");
        assert_eq!(pp.path_inferred, "/projects/git-tool.html");
        assert_eq!(pp.slug, "git-tool");
        assert_eq!(pp.date, None);
    }

    #[test]
    fn test_page_path_readme() {
        assert_eq!(PagePath::from_relative("posts/README.md").path_inferred, "/posts/");
        assert_eq!(PagePath::from_relative("README.md").path_inferred, "/");
        assert_eq!(PagePath::from_relative("docs/index.md").path_inferred, "/docs/");
    }

    #[test]
    fn test_page_path_date_prefix() {
        let pp = PagePath::from_relative("posts/2024-01-26-be-right-nicely.md");
        assert_eq!(pp.slug, "be-right-nicely");
        assert_eq!(pp.date, NaiveDate::from_ymd_opt(2024, 1, 26));
        assert_eq!(pp.path_inferred, "/posts/2024-01-26-be-right-nicely.html");
    }

    #[test]
    fn test_page_path_invalid_date_prefix() {
        let pp = PagePath::from_relative("posts/2024-13-40-nope.md");
        assert_eq!(pp.date, None);
        assert_eq!(pp.slug, "2024-13-40-nope");
    }

    #[test]
    fn test_page_path_windows_separators() {
        let pp = PagePath::from_relative("posts\\hello.md");
        assert_eq!(pp.file_path_relative, "posts/hello.md");
    }

    #[test]
    fn test_is_under() {
        let page = Page {
            file_path_relative: Some("posts/a.md".to_string()),
            ..Default::default()
        };
        assert!(page.is_under("posts/"));
        assert!(!page.is_under("projects/"));
        assert!(!Page::default().is_under(""));
    }

    #[test]
    fn test_canonical_path_precedence() {
        let mut page = Page {
            path: "/p".to_string(),
            ..Default::default()
        };
        assert_eq!(page.canonical_path(), "/p");
        page.path_inferred = Some("/inferred.html".to_string());
        assert_eq!(page.canonical_path(), "/inferred.html");
        page.permalink = Some("/custom/".to_string());
        assert_eq!(page.canonical_path(), "/custom/");
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page {
            file_path_relative: Some("posts/a.md".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("filePathRelative").is_some());
        assert!(json.get("contentRendered").is_some());
    }

    #[test]
    fn test_summary_prefers_description() {
        let mut page = Page {
            content_rendered: "<p>Hello <strong>World</strong></p>".to_string(),
            ..Default::default()
        };
        assert_eq!(page.summary(160), "Hello World");
        page.frontmatter.insert("description", "Custom");
        assert_eq!(page.summary(160), "Custom");
    }

    #[test]
    fn test_head_tag_from_value() {
        let tag = HeadTag::from_value(&json!(["link", { "rel": "icon", "href": "/favicon.ico" }]))
            .expect("parse");
        assert_eq!(tag.tag, "link");
        assert_eq!(tag.attrs.get("rel").map(String::as_str), Some("icon"));
        assert_eq!(tag.render(), r#"<link href="/favicon.ico" rel="icon">"#);

        assert!(HeadTag::from_value(&json!("link")).is_none());
        assert!(HeadTag::from_value(&json!([])).is_none());
    }

    #[test]
    fn test_head_tag_round_trip_value() {
        let tag = HeadTag::new("link", [("rel", "canonical"), ("href", "https://x.com/")]);
        assert_eq!(HeadTag::from_value(&tag.to_value()), Some(tag));
    }

    #[test]
    fn test_head_tag_render_script() {
        let tag = HeadTag::new("script", [("async", ""), ("src", "https://a/b.js")]);
        assert_eq!(tag.render(), r#"<script async src="https://a/b.js"></script>"#);

        let inline = HeadTag::new("script", Vec::<(String, String)>::new()).with_content("x()");
        assert_eq!(inline.render(), "<script>x()</script>");
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        let text = "Hello world this is a test";
        assert_eq!(truncate_at_word_boundary(text, 100), text);
        assert_eq!(truncate_at_word_boundary(text, 11), "Hello...");
        assert_eq!(truncate_at_word_boundary(text, 12), "Hello world...");

        let chinese_text = "你好世界 Hello World";
        assert_eq!(truncate_at_word_boundary(chinese_text, 7), "你好世界...");
    }
}
