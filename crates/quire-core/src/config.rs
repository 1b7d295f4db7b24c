//! Site configuration management.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    nav::NavItem,
    page::HeadTag,
};

/// Main configuration structure for Quire, loaded from `quire.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Markdown extension settings.
    #[serde(default)]
    pub markdown: MarkdownConfig,

    /// Theme and navigation settings.
    #[serde(default)]
    pub theme: ThemeConfig,

    /// Search engine metadata settings.
    #[serde(default)]
    pub seo: SeoConfig,

    /// Sitemap settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// RSS/Atom feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Analytics settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Page caches written for listing pages.
    #[serde(default)]
    pub cache: Vec<CacheConfig>,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Public origin of the site (e.g., "https://example.com").
    pub hostname: String,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: Option<String>,

    /// Language code for the `<html lang>` attribute.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Extra tags emitted in every page's `<head>`.
    #[serde(default)]
    pub head: Vec<HeadTag>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory holding Markdown sources.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory for generated data modules.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,

    /// Static files copied verbatim into the output.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Markdown extension configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    #[serde(default = "default_true")]
    pub footnotes: bool,

    #[serde(default = "default_true")]
    pub abbreviations: bool,

    /// `$…$` and `$$…$$` math rendered client-side with KaTeX.
    #[serde(default = "default_true")]
    pub math: bool,

    /// Fence info prefix that turns a code block into a diagram.
    #[serde(default = "default_diagram_marker")]
    pub diagram_marker: String,

    /// Marker that ends a page's excerpt.
    #[serde(default = "default_excerpt_marker")]
    pub excerpt_marker: String,

    /// Syntax highlighting theme name.
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,
}

/// Theme configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub logo: Option<String>,

    #[serde(default)]
    pub logo_dark: Option<String>,

    /// Repository link shown in the navbar.
    #[serde(default)]
    pub repo: Option<String>,

    #[serde(default = "default_repo_label")]
    pub repo_label: String,

    /// `owner/name` of the repository holding the site sources.
    #[serde(default)]
    pub docs_repo: Option<String>,

    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    #[serde(default = "default_docs_branch")]
    pub docs_branch: String,

    #[serde(default = "default_edit_link_text")]
    pub edit_link_text: String,

    /// Show the source file's last modification time.
    #[serde(default = "default_true")]
    pub last_updated: bool,

    /// Pages under this prefix use the post layout.
    #[serde(default = "default_posts_prefix")]
    pub post_prefix: String,

    #[serde(default = "default_post_layout")]
    pub post_layout: String,

    #[serde(default = "default_layout")]
    pub default_layout: String,

    /// Navigation bar entries.
    #[serde(default)]
    pub navbar: Vec<NavItem>,
}

/// A named person with an optional homepage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// SEO configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub author: Option<Author>,

    /// Pages under these prefixes are tagged as articles.
    #[serde(default = "default_article_prefixes")]
    pub article_prefixes: Vec<String>,
}

/// Sitemap change frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    /// Value used in `<changefreq>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

/// Sitemap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Output paths left out of the sitemap.
    #[serde(default = "default_exclude_paths")]
    pub exclude_paths: Vec<String>,

    #[serde(default)]
    pub changefreq: ChangeFreq,
}

/// Feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Write `rss.xml`.
    #[serde(default = "default_true")]
    pub rss: bool,

    /// Write `atom.xml`.
    #[serde(default = "default_true")]
    pub atom: bool,

    /// Pages under this prefix become feed items.
    #[serde(default = "default_posts_prefix")]
    pub prefix: String,

    /// Maximum number of items, newest first.
    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub channel: FeedChannel,
}

/// Feed channel metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedChannel {
    /// Copyright line; `{year}` is replaced with the current UTC year.
    #[serde(default)]
    pub copyright: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub author: Option<Author>,
}

/// Analytics configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Google Analytics measurement ID (e.g. `G-XXXXXXX`).
    #[serde(default)]
    pub google_id: Option<String>,
}

/// A page cache written to the temp directory as a JS data module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Export and file name; must be a JS identifier.
    pub name: String,

    /// Source path prefix, e.g. `posts/`.
    pub prefix: String,

    /// Sort descending by source path.
    #[serde(default)]
    pub reverse: bool,

    /// Keep the prefix's `README.md`.
    #[serde(default)]
    pub include_readme: bool,

    /// Drop pages without an excerpt.
    #[serde(default = "default_true")]
    pub require_excerpt: bool,
}

// Default value functions
fn default_lang() -> String {
    "en-GB".to_string()
}

fn default_content_dir() -> String {
    "content".to_string()
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_temp_dir() -> String {
    ".temp".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_true() -> bool {
    true
}

fn default_diagram_marker() -> String {
    "mermaid".to_string()
}

fn default_excerpt_marker() -> String {
    "<!-- more -->".to_string()
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_repo_label() -> String {
    "GitHub".to_string()
}

fn default_docs_dir() -> String {
    "content".to_string()
}

fn default_docs_branch() -> String {
    "main".to_string()
}

fn default_edit_link_text() -> String {
    "Edit this page".to_string()
}

fn default_posts_prefix() -> String {
    "posts/".to_string()
}

fn default_post_layout() -> String {
    "BlogPost".to_string()
}

fn default_layout() -> String {
    "Layout".to_string()
}

fn default_article_prefixes() -> Vec<String> {
    vec!["posts/".to_string()]
}

fn default_exclude_paths() -> Vec<String> {
    vec!["/404.html".to_string()]
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            hostname: String::new(),
            description: None,
            lang: default_lang(),
            head: Vec::new(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            footnotes: true,
            abbreviations: true,
            math: true,
            diagram_marker: default_diagram_marker(),
            excerpt_marker: default_excerpt_marker(),
            syntax_theme: default_syntax_theme(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            logo: None,
            logo_dark: None,
            repo: None,
            repo_label: default_repo_label(),
            docs_repo: None,
            docs_dir: default_docs_dir(),
            docs_branch: default_docs_branch(),
            edit_link_text: default_edit_link_text(),
            last_updated: true,
            post_prefix: default_posts_prefix(),
            post_layout: default_post_layout(),
            default_layout: default_layout(),
            navbar: Vec::new(),
        }
    }
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            author: None,
            article_prefixes: default_article_prefixes(),
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude_paths: default_exclude_paths(),
            changefreq: ChangeFreq::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            rss: true,
            atom: true,
            prefix: default_posts_prefix(),
            limit: None,
            channel: FeedChannel::default(),
        }
    }
}

impl CacheConfig {
    /// Create a cache with default options.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            reverse: false,
            include_readme: false,
            require_excerpt: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, layering `QUIRE__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("QUIRE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        if self.site.hostname.is_empty() {
            return Err(CoreError::config("site.hostname cannot be empty"));
        }

        if !self.site.hostname.starts_with("http://") && !self.site.hostname.starts_with("https://")
        {
            return Err(CoreError::config(format!(
                "site.hostname must start with http:// or https://, found `{}`",
                self.site.hostname
            )));
        }

        if self.site.hostname.ends_with('/') {
            tracing::warn!("site.hostname should not have a trailing slash");
        }

        let mut names = HashSet::new();
        for cache in &self.cache {
            if !is_js_identifier(&cache.name) {
                return Err(CoreError::config(format!(
                    "cache name `{}` is not a valid JavaScript identifier",
                    cache.name
                )));
            }
            if !names.insert(cache.name.as_str()) {
                return Err(CoreError::config(format!(
                    "cache name `{}` is declared more than once",
                    cache.name
                )));
            }
        }

        Ok(())
    }

    /// Get the absolute URL for a site path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.hostname.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
