//! Content collection.
//!
//! Walks the content directory, parses every file the parser accepts and
//! turns it into a [`Page`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use quire_core::{Config, Page, PagePath};
use quire_parser::ContentParser;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::assets::is_hidden;

/// Content collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// IO error.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parser error.
    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Directory traversal error.
    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Collected site content.
#[derive(Debug, Default)]
pub struct SiteContent {
    /// Pages sorted by source path.
    pub pages: Vec<Page>,

    /// Files that failed to read or parse.
    pub skipped: Vec<CollectorError>,
}

/// Content collector that walks directories and parses files.
#[derive(Debug)]
pub struct ContentCollector<'a> {
    config: &'a Config,
    content_dir: PathBuf,
}

impl<'a> ContentCollector<'a> {
    #[must_use]
    pub fn new(config: &'a Config, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            content_dir: content_dir.into(),
        }
    }

    /// Collect every page under the content directory.
    ///
    /// Files that fail to parse are logged and reported in
    /// [`SiteContent::skipped`] rather than failing the collection.
    pub fn collect<P>(&self, parser: &P) -> Result<SiteContent>
    where
        P: ContentParser + ?Sized,
    {
        info!(dir = %self.content_dir.display(), "collecting content");

        let files = self.find_content_files(parser)?;
        debug!(count = files.len(), "found content files");

        let results: Vec<Result<Page>> = files
            .par_iter()
            .map(|path| self.parse_file(path, parser))
            .collect();

        let mut content = SiteContent::default();
        for result in results {
            match result {
                Ok(page) => content.pages.push(page),
                Err(e) => {
                    warn!(error = %e, "skipping content file");
                    content.skipped.push(e);
                }
            }
        }

        content
            .pages
            .sort_by(|a, b| a.file_path_relative.cmp(&b.file_path_relative));

        info!(
            pages = content.pages.len(),
            skipped = content.skipped.len(),
            "content collection complete"
        );
        Ok(content)
    }

    fn find_content_files<P>(&self, parser: &P) -> Result<Vec<PathBuf>>
    where
        P: ContentParser + ?Sized,
    {
        if !self.content_dir.is_dir() {
            warn!(dir = %self.content_dir.display(), "content directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.content_dir)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file()
                && let Some(ext) = entry.path().extension()
                && parser.accepts(&ext.to_string_lossy())
            {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn parse_file<P>(&self, path: &Path, parser: &P) -> Result<Page>
    where
        P: ContentParser + ?Sized,
    {
        debug!(path = %path.display(), "parsing file");

        let io_error = |source| CollectorError::Io {
            path: path.to_path_buf(),
            source,
        };
        let source = fs::read_to_string(path).map_err(io_error)?;
        let last_updated = if self.config.theme.last_updated {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from)
        } else {
            None
        };

        let relative = path
            .strip_prefix(&self.content_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let paths = PagePath::from_relative(&relative);

        let parsed = parser
            .parse(&source, path)
            .map_err(|e| CollectorError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let frontmatter = parsed.frontmatter;
        let title = frontmatter
            .title()
            .map(str::to_string)
            .or(parsed.rendered.title)
            .unwrap_or_else(|| paths.slug.clone());
        let permalink = frontmatter.permalink().map(str::to_string);
        let date = frontmatter.date().or(paths.date);

        Ok(Page {
            title,
            path: permalink
                .clone()
                .unwrap_or_else(|| paths.path_inferred.clone()),
            permalink,
            path_inferred: Some(paths.path_inferred),
            file_path_relative: Some(paths.file_path_relative),
            frontmatter,
            slug: paths.slug,
            date,
            headers: parsed.rendered.headers,
            content_rendered: parsed.rendered.html,
            last_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use quire_parser::MarkdownRenderer;
    use tempfile::TempDir;

    use super::*;

    fn test_config() -> Config {
        Config::parse(
            r#"
[site]
title = "Test Site"
hostname = "https://example.com"
"#,
        )
        .unwrap()
    }

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collect_pages() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# Home\n\nWelcome");
        write(
            dir.path(),
            "posts/2024-01-26-be-right.md",
            "---\ntitle: Be Right, Nicely\n---\n\nIntro\n\n## Details\n",
        );
        write(
            dir.path(),
            "archive.md",
            "---\npermalink: /archive/\ndate: 2023-05-01\n---\n\nAll posts",
        );
        write(dir.path(), "notes.txt", "not content");

        let config = test_config();
        let content = ContentCollector::new(&config, dir.path())
            .collect(&MarkdownRenderer::new())
            .unwrap();

        assert!(content.skipped.is_empty());
        let relative: Vec<&str> = content
            .pages
            .iter()
            .filter_map(|p| p.file_path_relative.as_deref())
            .collect();
        assert_eq!(
            relative,
            vec!["README.md", "archive.md", "posts/2024-01-26-be-right.md"]
        );

        let home = &content.pages[0];
        assert_eq!(home.title, "Home");
        assert_eq!(home.path, "/");
        assert!(home.last_updated.is_some());

        let archive = &content.pages[1];
        assert_eq!(archive.path, "/archive/");
        assert_eq!(archive.path_inferred.as_deref(), Some("/archive.html"));
        assert_eq!(archive.date, NaiveDate::from_ymd_opt(2023, 5, 1));

        let post = &content.pages[2];
        assert_eq!(post.title, "Be Right, Nicely");
        assert_eq!(post.slug, "be-right");
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 1, 26));
        assert_eq!(post.headers.len(), 1);
        assert!(post.content_rendered.contains("<p>Intro</p>"));
    }

    #[test]
    fn test_title_falls_back_to_slug() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "untitled.md", "Just text");

        let config = test_config();
        let content = ContentCollector::new(&config, dir.path())
            .collect(&MarkdownRenderer::new())
            .unwrap();

        assert_eq!(content.pages[0].title, "untitled");
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".drafts/secret.md", "# Secret");
        write(dir.path(), ".hidden.md", "# Hidden");
        write(dir.path(), "visible.md", "# Visible");

        let config = test_config();
        let content = ContentCollector::new(&config, dir.path())
            .collect(&MarkdownRenderer::new())
            .unwrap();

        assert_eq!(content.pages.len(), 1);
        assert_eq!(content.pages[0].title, "Visible");
    }

    #[test]
    fn test_parse_errors_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.md", "---\ntitle: [unclosed\n---\n\nBody");
        write(dir.path(), "fine.md", "# Fine");

        let config = test_config();
        let content = ContentCollector::new(&config, dir.path())
            .collect(&MarkdownRenderer::new())
            .unwrap();

        assert_eq!(content.pages.len(), 1);
        assert_eq!(content.skipped.len(), 1);
        assert!(matches!(content.skipped[0], CollectorError::Parse { .. }));
    }

    #[test]
    fn test_missing_content_dir() {
        let dir = TempDir::new().unwrap();
        let config = test_config();
        let content = ContentCollector::new(&config, dir.path().join("content"))
            .collect(&MarkdownRenderer::new())
            .unwrap();

        assert!(content.pages.is_empty());
    }
}
