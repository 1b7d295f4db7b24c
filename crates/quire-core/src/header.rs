//! Page heading tree and heading text fixup.
//!
//! Heading titles are captured from rendered HTML, so they carry the
//! entity-escaped form of quotes and ampersands. The fixup decodes those
//! back into display text before the headers reach the sidebar/TOC.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Entities decoded in heading display text.
const DECODED_ENTITIES: [(&str, &str); 3] = [("&#39;", "'"), ("&amp;", "&"), ("&quot;", "\"")];

/// A heading in a page, with nested sub-headings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    /// Heading level (1-6).
    pub level: u8,

    /// Display text.
    pub title: String,

    /// Anchor slug.
    pub slug: String,

    /// Fragment link, `#slug`.
    pub link: String,

    /// Sub-headings.
    #[serde(default)]
    pub children: Vec<PageHeader>,
}

impl PageHeader {
    /// Create a header without children.
    pub fn new(level: u8, title: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            level,
            title: title.into(),
            link: format!("#{slug}"),
            slug,
            children: Vec::new(),
        }
    }
}

/// Decode `&#39;`, `&amp;` and `&quot;` in a single left-to-right pass.
///
/// Decoded output is never rescanned, so `&amp;quot;` becomes `&quot;`.
/// Any other `&` sequence is passed through as-is.
pub fn html_decode(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match DECODED_ENTITIES
            .iter()
            .find(|(entity, _)| tail.starts_with(entity))
        {
            Some((entity, decoded)) => {
                out.push_str(decoded);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode the title of a header and every one of its descendants.
pub fn fix_page_header(header: &mut PageHeader) {
    if let Cow::Owned(decoded) = html_decode(&header.title) {
        header.title = decoded;
    }
    fix_page_headers(&mut header.children);
}

/// Apply [`fix_page_header`] to a list of headers.
pub fn fix_page_headers(headers: &mut [PageHeader]) {
    for header in headers {
        fix_page_header(header);
    }
}
