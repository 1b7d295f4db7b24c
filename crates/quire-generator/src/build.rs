//! Build orchestration.
//!
//! Coordinates the full site build process.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use quire_core::{Config, Page};
use quire_parser::MarkdownRenderer;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    assets::{AssetError, AssetProcessor},
    collector::{CollectorError, ContentCollector},
    feed::FeedError,
    html::{HtmlError, HtmlGenerator},
    page_cache::PageCacheError,
    plugin::{GeneratedContext, Plugin, PrepareContext, default_plugins},
    sitemap::SitemapError,
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collector error.
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// HTML generation error.
    #[error("HTML error: {0}")]
    Html(#[from] HtmlError),

    /// Page cache error.
    #[error("page cache error: {0}")]
    PageCache(#[from] PageCacheError),

    /// Feed generation error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Sitemap generation error.
    #[error("sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of pages written.
    pub pages: usize,

    /// Number of content files skipped because they failed to parse.
    pub skipped: usize,

    /// Number of static assets copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that orchestrates the build process.
pub struct Builder {
    config: Config,
    content_dir: PathBuf,
    output_dir: PathBuf,
    static_dir: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("content_dir", &self.content_dir)
            .field("output_dir", &self.output_dir)
            .field("static_dir", &self.static_dir)
            .field("temp_dir", &self.temp_dir)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Builder {
    /// Create a builder without plugins.
    #[must_use]
    pub fn new(
        config: Config,
        content_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            content_dir: content_dir.into(),
            output_dir: output_dir.into(),
            static_dir: None,
            temp_dir: None,
            plugins: Vec::new(),
        }
    }

    /// Set the static assets directory.
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Set the directory for generated data modules.
    ///
    /// Defaults to `build.temp_dir` inside the content directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Register a plugin. Plugins run in registration order.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Register the built-in blog plugins.
    #[must_use]
    pub fn with_default_plugins(mut self) -> Self {
        self.plugins.extend(default_plugins());
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory receiving page cache modules.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| self.content_dir.join(&self.config.build.temp_dir))
    }

    /// Collect and prepare pages without writing anything.
    ///
    /// Returns the prepared pages and the number of files skipped.
    pub fn collect_pages(&self) -> Result<(Vec<Page>, usize)> {
        let mut renderer = MarkdownRenderer::from_config(&self.config.markdown);
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "extending markdown");
            plugin.extend_markdown(&mut renderer, &self.config);
        }

        let content = ContentCollector::new(&self.config, &self.content_dir).collect(&renderer)?;

        let mut pages = content.pages;
        for page in &mut pages {
            for plugin in &self.plugins {
                plugin.extend_page(page, &self.config);
            }
        }

        Ok((pages, content.skipped.len()))
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            content = %self.content_dir.display(),
            output = %self.output_dir.display(),
            "starting build"
        );

        self.clean_output()?;

        let (pages, skipped) = self.collect_pages()?;
        stats.skipped = skipped;

        let temp_dir = self.temp_dir();
        let prepared = PrepareContext {
            config: &self.config,
            pages: &pages,
            temp_dir: &temp_dir,
        };
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running on_prepared");
            plugin.on_prepared(&prepared)?;
        }

        stats.pages = self.generate_pages(&pages)?;

        if let Some(static_dir) = &self.static_dir {
            stats.assets = AssetProcessor::new(static_dir).copy_to(&self.output_dir)?;
        }

        let generated = GeneratedContext {
            config: &self.config,
            pages: &pages,
            output_dir: &self.output_dir,
        };
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running on_generated");
            plugin.on_generated(&generated)?;
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = stats.pages,
            skipped = stats.skipped,
            assets = stats.assets,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Clean the output directory.
    fn clean_output(&self) -> Result<()> {
        if self.output_dir.exists() {
            debug!(dir = %self.output_dir.display(), "cleaning output directory");
            fs::remove_dir_all(&self.output_dir)?;
        }
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Write every page plus `404.html`, returning the number of pages.
    fn generate_pages(&self, pages: &[Page]) -> Result<usize> {
        let generator = HtmlGenerator::new(&self.config, pages);

        info!(count = pages.len(), "generating HTML pages");

        pages.par_iter().try_for_each(|page| {
            let html = generator.generate_page(page)?;
            let output_path = generator.output_path(page, &self.output_dir);
            write_file(&output_path, &html)?;
            debug!(path = %output_path.display(), "wrote page");
            Ok::<_, BuildError>(())
        })?;

        let not_found = self.output_dir.join("404.html");
        if !not_found.exists() {
            write_file(&not_found, &generator.generate_not_found()?)?;
        }

        Ok(pages.len())
    }
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
