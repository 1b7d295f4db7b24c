//! Sitemap generation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use quire_core::{Config, Page, config::ChangeFreq};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// Sitemap generation errors.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sitemap operations.
pub type Result<T> = std::result::Result<T, SitemapError>;

/// A sitemap URL entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
    pub changefreq: ChangeFreq,
}

/// Sitemap generator.
#[derive(Debug)]
pub struct SitemapGenerator<'a> {
    config: &'a Config,
}

impl<'a> SitemapGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Entries for every page not excluded by path or `sitemap: false`.
    pub fn urls(&self, pages: &[Page]) -> Vec<SitemapUrl> {
        let exclude = &self.config.sitemap.exclude_paths;

        let mut urls: Vec<SitemapUrl> = pages
            .iter()
            .filter(|page| !exclude.iter().any(|p| p == &page.path))
            .filter(|page| page.frontmatter.get("sitemap") != Some(&Value::Bool(false)))
            .map(|page| self.page_to_url(page))
            .collect();

        urls.sort_by(|a, b| a.loc.cmp(&b.loc));
        urls
    }

    /// Generate sitemap XML from pages.
    pub fn generate(&self, pages: &[Page]) -> String {
        let urls = self.urls(pages);
        debug!(count = urls.len(), "generating sitemap");

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for url in &urls {
            xml.push_str(&url_to_xml(url));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Write `sitemap.xml` into `output_dir`.
    pub fn write(&self, pages: &[Page], output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join("sitemap.xml");
        fs::write(&path, self.generate(pages))?;
        info!(path = %path.display(), "generated sitemap");
        Ok(path)
    }

    fn page_to_url(&self, page: &Page) -> SitemapUrl {
        let lastmod = page
            .frontmatter
            .updated()
            .or_else(|| page.last_updated.map(|d| d.date_naive()))
            .or(page.date);

        SitemapUrl {
            loc: self.config.url_for(&page.path),
            lastmod,
            changefreq: self.config.sitemap.changefreq,
        }
    }
}

fn url_to_xml(url: &SitemapUrl) -> String {
    let mut xml = String::from("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));

    if let Some(lastmod) = &url.lastmod {
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            lastmod.format("%Y-%m-%d")
        ));
    }

    xml.push_str(&format!(
        "    <changefreq>{}</changefreq>\n",
        url.changefreq.as_str()
    ));
    xml.push_str("  </url>\n");
    xml
}

/// Escape XML special characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use quire_core::PagePath;

    use super::*;

    fn test_config() -> Config {
        Config::parse(
            r#"
[site]
title = "Test Site"
hostname = "https://example.com"
"#,
        )
        .expect("config")
    }

    fn test_page(relative: &str) -> Page {
        let paths = PagePath::from_relative(relative);
        Page {
            title: paths.slug.clone(),
            path: paths.path_inferred.clone(),
            path_inferred: Some(paths.path_inferred),
            file_path_relative: Some(paths.file_path_relative),
            slug: paths.slug,
            date: paths.date,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_sitemap() {
        let config = test_config();
        let pages = vec![test_page("README.md"), test_page("posts/2024-01-26-a.md")];

        let xml = SitemapGenerator::new(&config).generate(&pages);

        assert!(xml.contains("<urlset"));
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/posts/2024-01-26-a.html</loc>"));
        assert!(xml.contains("<lastmod>2024-01-26</lastmod>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
    }

    #[test]
    fn test_excluded_paths() {
        let config = test_config();
        let pages = vec![test_page("404.md"), test_page("about.md")];

        let urls = SitemapGenerator::new(&config).urls(&pages);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].loc, "https://example.com/about.html");
    }

    #[test]
    fn test_frontmatter_opt_out() {
        let config = test_config();
        let mut hidden = test_page("hidden.md");
        hidden.frontmatter.insert("sitemap", false);

        assert!(SitemapGenerator::new(&config).urls(&[hidden]).is_empty());
    }

    #[test]
    fn test_lastmod_precedence() {
        let config = test_config();
        let generator = SitemapGenerator::new(&config);

        let mut page = test_page("posts/2024-01-26-a.md");
        page.last_updated = Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(
            generator.page_to_url(&page).lastmod,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );

        page.frontmatter.insert("updated", "2024-04-02");
        assert_eq!(
            generator.page_to_url(&page).lastmod,
            NaiveDate::from_ymd_opt(2024, 4, 2)
        );
    }

    #[test]
    fn test_changefreq_from_config() {
        let mut config = test_config();
        config.sitemap.changefreq = ChangeFreq::Weekly;

        let xml = SitemapGenerator::new(&config).generate(&[test_page("a.md")]);
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
    }
}
