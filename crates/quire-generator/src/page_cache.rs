//! Page caches consumed by listing pages.
//!
//! A cache is a filtered, sorted snapshot of page metadata written to the
//! temp directory as `export const <name> = <json>`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use quire_core::{CacheConfig, Frontmatter, Page};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Default excerpt marker.
pub const EXCERPT_MARKER: &str = "<!-- more -->";

/// Page cache errors.
#[derive(Debug, Error)]
pub enum PageCacheError {
    /// Writing the cache module failed.
    #[error("failed to write page cache `{name}`: {source}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for page cache operations.
pub type Result<T> = std::result::Result<T, PageCacheError>;

/// Options controlling which pages enter a cache and in what order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Sort descending by source path.
    pub reverse: bool,

    /// Keep the prefix's `README.md`.
    pub include_readme: bool,

    /// Drop pages without a non-empty excerpt.
    pub require_excerpt: bool,

    /// Marker that ends the excerpt.
    pub excerpt_marker: String,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            include_readme: false,
            require_excerpt: true,
            excerpt_marker: EXCERPT_MARKER.to_string(),
        }
    }
}

impl CacheOptions {
    /// Options for a configured cache, using the site's excerpt marker.
    pub fn from_config(cache: &CacheConfig, excerpt_marker: &str) -> Self {
        Self {
            reverse: cache.reverse,
            include_readme: cache.include_readme,
            require_excerpt: cache.require_excerpt,
            excerpt_marker: excerpt_marker.to_string(),
        }
    }
}

/// Simplified page record stored in a cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<'a> {
    pub title: &'a str,
    pub path: &'a str,
    pub permalink: Option<&'a str>,
    pub file_path_relative: &'a str,
    pub frontmatter: &'a Frontmatter,
    pub slug: &'a str,
    pub date: Option<NaiveDate>,
    pub excerpt: Option<&'a str>,
}

/// Everything before the first `marker`, or `None` when it is absent.
pub fn extract_excerpt<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    content.split_once(marker).map(|(before, _)| before)
}

/// Build the cache entries for pages under `prefix`.
///
/// Pages without a source path never match.
pub fn build_page_cache<'a>(
    pages: &'a [Page],
    prefix: &str,
    options: &CacheOptions,
) -> Vec<CacheEntry<'a>> {
    let readme = format!("{}/README.md", prefix.trim_end_matches('/'));

    let mut entries: Vec<CacheEntry<'a>> = pages
        .iter()
        .filter_map(|page| {
            let relative = page.file_path_relative.as_deref()?;
            if !relative.starts_with(prefix) {
                return None;
            }
            if !options.include_readme && relative == readme {
                return None;
            }

            let excerpt = extract_excerpt(&page.content_rendered, &options.excerpt_marker);
            if options.require_excerpt && excerpt.is_none_or(str::is_empty) {
                return None;
            }

            Some(CacheEntry {
                title: &page.title,
                path: &page.path,
                permalink: page.permalink.as_deref(),
                file_path_relative: relative,
                frontmatter: &page.frontmatter,
                slug: &page.slug,
                date: page.date,
                excerpt,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        let ord = a.file_path_relative.cmp(b.file_path_relative);
        if options.reverse { ord.reverse() } else { ord }
    });

    debug!(prefix, count = entries.len(), "built page cache");
    entries
}

/// Write `<dir>/<name>.js` containing `export const <name> = <json>`.
pub fn write_page_cache(dir: &Path, name: &str, entries: &[CacheEntry<'_>]) -> io::Result<PathBuf> {
    let json = serde_json::to_string(entries)?;

    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{name}.js"));
    fs::write(&path, format!("export const {name} = {json}"))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(relative: &str, content: &str) -> Page {
        let paths = quire_core::PagePath::from_relative(relative);
        Page {
            title: paths.slug.clone(),
            path: paths.path_inferred.clone(),
            path_inferred: Some(paths.path_inferred),
            file_path_relative: Some(paths.file_path_relative),
            slug: paths.slug,
            date: paths.date,
            content_rendered: content.to_string(),
            ..Default::default()
        }
    }

    fn relative_paths<'a>(entries: &[CacheEntry<'a>]) -> Vec<&'a str> {
        entries.iter().map(|e| e.file_path_relative).collect()
    }

    #[test]
    fn test_extract_excerpt() {
        assert_eq!(extract_excerpt("Intro<!-- more -->Body", EXCERPT_MARKER), Some("Intro"));
        assert_eq!(
            extract_excerpt("A<!-- more -->B<!-- more -->C", EXCERPT_MARKER),
            Some("A")
        );
        assert_eq!(extract_excerpt("No marker here", EXCERPT_MARKER), None);
    }

    #[test]
    fn test_excerpt_of_excerpt_has_no_marker() {
        for content in [
            "Intro<!-- more -->Body",
            "A<!-- more -->B<!-- more -->C",
            "<!-- more -->Body",
            "<p>Lead</p>\n<!-- more -->\n<p>Rest</p>",
        ] {
            let excerpt = extract_excerpt(content, EXCERPT_MARKER).unwrap();
            assert_eq!(extract_excerpt(excerpt, EXCERPT_MARKER), None, "{content}");
        }
    }

    #[test]
    fn test_pages_without_marker_are_dropped() {
        let pages = vec![
            page("posts/a.md", "Intro<!-- more -->Body"),
            page("posts/b.md", "No marker"),
        ];

        let entries = build_page_cache(&pages, "posts/", &CacheOptions::default());
        assert_eq!(relative_paths(&entries), vec!["posts/a.md"]);
        assert_eq!(entries[0].excerpt, Some("Intro"));
    }

    #[test]
    fn test_empty_excerpt_is_dropped() {
        let pages = vec![page("posts/a.md", "<!-- more -->Body")];

        let entries = build_page_cache(&pages, "posts/", &CacheOptions::default());
        assert!(entries.is_empty());
    }

    #[test]
    fn test_excerpt_not_required() {
        let pages = vec![page("projects/a.md", "No marker")];
        let options = CacheOptions {
            require_excerpt: false,
            ..Default::default()
        };

        let entries = build_page_cache(&pages, "projects/", &options);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].excerpt, None);
    }

    #[test]
    fn test_readme_is_excluded() {
        let pages = vec![
            page("posts/README.md", "Index<!-- more -->"),
            page("posts/a.md", "A<!-- more -->"),
        ];

        for prefix in ["posts/", "posts"] {
            let entries = build_page_cache(&pages, prefix, &CacheOptions::default());
            assert_eq!(relative_paths(&entries), vec!["posts/a.md"], "prefix {prefix}");
        }
    }

    #[test]
    fn test_readme_included_on_request() {
        let pages = vec![page("posts/README.md", "Index<!-- more -->")];
        let options = CacheOptions {
            include_readme: true,
            ..Default::default()
        };

        assert_eq!(build_page_cache(&pages, "posts/", &options).len(), 1);
    }

    #[test]
    fn test_nested_readme_is_kept() {
        let pages = vec![page("posts/series/README.md", "Series<!-- more -->")];

        let entries = build_page_cache(&pages, "posts/", &CacheOptions::default());
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_prefix_filter() {
        let pages = vec![
            page("posts/a.md", "A<!-- more -->"),
            page("projects/b.md", "B<!-- more -->"),
            page("postscript.md", "C<!-- more -->"),
        ];

        let entries = build_page_cache(&pages, "posts/", &CacheOptions::default());
        assert_eq!(relative_paths(&entries), vec!["posts/a.md"]);
    }

    #[test]
    fn test_pages_without_source_path_never_match() {
        let mut orphan = page("posts/a.md", "A<!-- more -->");
        orphan.file_path_relative = None;

        assert!(build_page_cache(&[orphan], "", &CacheOptions::default()).is_empty());
    }

    #[test]
    fn test_sort_ascending_and_reverse() {
        let pages = vec![
            page("posts/b.md", "B<!-- more -->"),
            page("posts/c.md", "C<!-- more -->"),
            page("posts/a.md", "A<!-- more -->"),
        ];

        let ascending = build_page_cache(&pages, "posts/", &CacheOptions::default());
        assert_eq!(
            relative_paths(&ascending),
            vec!["posts/a.md", "posts/b.md", "posts/c.md"]
        );

        let options = CacheOptions {
            reverse: true,
            ..Default::default()
        };
        let descending = build_page_cache(&pages, "posts/", &options);
        assert_eq!(
            relative_paths(&descending),
            vec!["posts/c.md", "posts/b.md", "posts/a.md"]
        );

        let mut reversed = relative_paths(&ascending);
        reversed.reverse();
        assert_eq!(relative_paths(&descending), reversed);
    }

    #[test]
    fn test_date_prefixed_posts_sort_newest_first() {
        let pages = vec![
            page("posts/2023-05-01-older.md", "Old<!-- more -->"),
            page("posts/2024-01-26-newer.md", "New<!-- more -->"),
        ];
        let options = CacheOptions {
            reverse: true,
            ..Default::default()
        };

        let entries = build_page_cache(&pages, "posts/", &options);
        assert_eq!(entries[0].slug, "newer");
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2024, 1, 26));
    }

    #[test]
    fn test_custom_marker() {
        let pages = vec![page("posts/a.md", "Lead<hr class=\"fold\">Rest")];
        let options = CacheOptions {
            excerpt_marker: "<hr class=\"fold\">".to_string(),
            ..Default::default()
        };

        let entries = build_page_cache(&pages, "posts/", &options);
        assert_eq!(entries[0].excerpt, Some("Lead"));
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let pages = vec![page("posts/a.md", "A<!-- more -->")];
        let entries = build_page_cache(&pages, "posts/", &CacheOptions::default());

        let json = serde_json::to_value(&entries).expect("serialize");
        assert_eq!(json[0]["filePathRelative"], "posts/a.md");
        assert_eq!(json[0]["excerpt"], "A");
        assert_eq!(json[0]["permalink"], serde_json::Value::Null);
    }

    #[test]
    fn test_write_page_cache() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let pages = vec![page("posts/a.md", "A<!-- more -->")];
        let entries = build_page_cache(&pages, "posts/", &CacheOptions::default());

        let path = write_page_cache(&dir.path().join("nested"), "posts", &entries).expect("write");
        assert_eq!(path, dir.path().join("nested").join("posts.js"));

        let written = fs::read_to_string(&path).expect("read");
        assert!(written.starts_with("export const posts = ["));
        assert!(written.contains("\"slug\":\"a\""));
    }

    #[test]
    fn test_write_empty_cache() {
        let dir = tempfile::tempdir().expect("create temp dir");

        let path = write_page_cache(dir.path(), "licenses", &[]).expect("write");
        assert_eq!(
            fs::read_to_string(path).expect("read"),
            "export const licenses = []"
        );
    }

    #[test]
    fn test_write_surfaces_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").expect("write");

        let err = write_page_cache(&blocker, "posts", &[]).unwrap_err();
        assert_ne!(err.kind(), io::ErrorKind::Other);
    }
}
