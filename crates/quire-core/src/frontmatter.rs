//! Frontmatter parsing for content files.
//!
//! Frontmatter is kept as an open key/value map: the generator only reads a
//! handful of well-known keys and passes everything else through untouched
//! to the page caches and templates.

use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Open frontmatter map for a content file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter(Map<String, Value>);

/// Delimiter types for frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML frontmatter delimited by `---`.
    Yaml,
    /// TOML frontmatter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

impl Frontmatter {
    /// Create an empty frontmatter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a non-empty string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    pub fn permalink(&self) -> Option<&str> {
        self.get_str("permalink")
    }

    pub fn layout(&self) -> Option<&str> {
        self.get_str("layout")
    }

    /// Publication date, if present and parseable.
    pub fn date(&self) -> Option<NaiveDate> {
        self.get_str("date").and_then(parse_date)
    }

    /// Last update date, if present and parseable.
    pub fn updated(&self) -> Option<NaiveDate> {
        self.get_str("updated").and_then(parse_date)
    }

    /// Head entries declared by the page (`[tag, {attrs}]` arrays).
    pub fn head(&self) -> &[Value] {
        match self.0.get("head") {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Append a head entry, replacing a missing or non-array `head` value
    /// with an empty list first.
    pub fn push_head(&mut self, entry: Value) {
        let mut items = match self.0.remove("head") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        items.push(entry);
        self.0.insert("head".to_string(), Value::Array(items));
    }
}

impl From<Map<String, Value>> for Frontmatter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Parse a `YYYY-MM-DD` or RFC 3339 date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            raw.get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        })
}

/// Split content into frontmatter and body.
///
/// The opening delimiter must start the file and the closing delimiter must
/// sit on a line of its own.
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.trim_start_matches('\u{feff}');

    let format = if content.starts_with("---") {
        FrontmatterFormat::Yaml
    } else if content.starts_with("+++") {
        FrontmatterFormat::Toml
    } else {
        return None;
    };

    let delimiter = format.delimiter();
    let rest = &content[delimiter.len()..];
    let after_first = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))?;

    let mut offset = 0;
    for line in after_first.split_inclusive('\n') {
        if line.trim_end() == delimiter {
            let frontmatter = after_first[..offset].trim();
            let body = after_first[offset + line.len()..].trim_start();
            return Some((format, frontmatter, body));
        }
        offset += line.len();
    }

    None
}

/// Parse frontmatter from a string.
///
/// Content without a frontmatter block yields an empty map and the full
/// content as body.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let Some((format, fm_str, body)) = split_frontmatter(content) else {
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let value = match format {
        FrontmatterFormat::Yaml => serde_yaml::from_str::<Value>(fm_str)
            .map_err(|e| CoreError::frontmatter(path, e.to_string()))?,
        FrontmatterFormat::Toml => toml::from_str::<toml::Value>(fm_str)
            .map(toml_to_json)
            .map_err(|e| CoreError::frontmatter(path, e.to_string()))?,
    };

    let frontmatter = match value {
        Value::Object(map) => Frontmatter(map),
        Value::Null => Frontmatter::default(),
        other => {
            return Err(CoreError::frontmatter(
                path,
                format!("expected a key/value mapping, found `{other}`"),
            ));
        }
    };

    Ok((frontmatter, body.to_string()))
}

/// Convert TOML values to JSON, rendering datetimes as strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
