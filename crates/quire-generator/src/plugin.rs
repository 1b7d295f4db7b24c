//! Build hooks.
//!
//! A [`Plugin`] can extend the Markdown renderer, adjust each page after it
//! is collected, act on the prepared page list, and write extra output once
//! pages are generated. Hooks run sequentially in registration order and
//! only ever see an immutable snapshot of the page list.

use std::path::Path;

use quire_core::{Config, HeadTag, Page, fix_page_headers};
use quire_parser::{DiagramFence, MarkdownRenderer};
use tracing::{debug, info};

use crate::{
    build::Result,
    feed::FeedGenerator,
    page_cache::{CacheOptions, PageCacheError, build_page_cache, write_page_cache},
    sitemap::SitemapGenerator,
};

/// Context passed to [`Plugin::on_prepared`].
#[derive(Debug, Clone, Copy)]
pub struct PrepareContext<'a> {
    pub config: &'a Config,
    pub pages: &'a [Page],
    /// Directory for generated data modules.
    pub temp_dir: &'a Path,
}

/// Context passed to [`Plugin::on_generated`].
#[derive(Debug, Clone, Copy)]
pub struct GeneratedContext<'a> {
    pub config: &'a Config,
    pub pages: &'a [Page],
    pub output_dir: &'a Path,
}

/// A set of build hooks. Every hook defaults to doing nothing.
pub trait Plugin: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Extend the Markdown pipeline before any page is rendered.
    fn extend_markdown(&self, _renderer: &mut MarkdownRenderer, _config: &Config) {}

    /// Adjust a page after it has been collected.
    fn extend_page(&self, _page: &mut Page, _config: &Config) {}

    /// Act on the complete page list before pages are written.
    fn on_prepared(&self, _ctx: &PrepareContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Write additional output after pages are written.
    fn on_generated(&self, _ctx: &GeneratedContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Renders fences tagged with the configured diagram marker client-side.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramPlugin;

impl Plugin for DiagramPlugin {
    fn name(&self) -> &str {
        "diagram"
    }

    fn extend_markdown(&self, renderer: &mut MarkdownRenderer, config: &Config) {
        let marker = config.markdown.diagram_marker.clone();
        renderer.wrap_fence(|previous| Box::new(DiagramFence::new(marker, previous)));
    }
}

/// Header fixup, default layouts and canonical links.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlogPagePlugin;

impl Plugin for BlogPagePlugin {
    fn name(&self) -> &str {
        "blog-page"
    }

    fn extend_page(&self, page: &mut Page, config: &Config) {
        fix_page_headers(&mut page.headers);

        if page.frontmatter.layout().is_none() {
            let theme = &config.theme;
            let layout = if page.is_under(&theme.post_prefix) {
                &theme.post_layout
            } else {
                &theme.default_layout
            };
            page.frontmatter.insert("layout", layout.clone());
        }

        let href = format!(
            "{}{}",
            config.site.hostname.trim_end_matches('/'),
            page.canonical_path()
        );
        page.frontmatter
            .push_head(HeadTag::new("link", [("rel", "canonical"), ("href", href.as_str())]).to_value());
    }
}

/// Writes every configured `[[cache]]` as a data module.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageCachePlugin;

impl Plugin for PageCachePlugin {
    fn name(&self) -> &str {
        "page-cache"
    }

    fn on_prepared(&self, ctx: &PrepareContext<'_>) -> Result<()> {
        for cache in &ctx.config.cache {
            let options = CacheOptions::from_config(cache, &ctx.config.markdown.excerpt_marker);
            let entries = build_page_cache(ctx.pages, &cache.prefix, &options);

            let path = write_page_cache(ctx.temp_dir, &cache.name, &entries).map_err(|source| {
                PageCacheError::Write {
                    name: cache.name.clone(),
                    source,
                }
            })?;

            info!(
                name = %cache.name,
                count = entries.len(),
                path = %path.display(),
                "wrote page cache"
            );
        }

        Ok(())
    }
}

/// Writes `rss.xml` and `atom.xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedPlugin;

impl Plugin for FeedPlugin {
    fn name(&self) -> &str {
        "feed"
    }

    fn on_generated(&self, ctx: &GeneratedContext<'_>) -> Result<()> {
        let generator = FeedGenerator::new(ctx.config);
        let written = generator.write(ctx.pages, ctx.output_dir)?;
        debug!(files = written.len(), "feeds written");
        Ok(())
    }
}

/// Writes `sitemap.xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SitemapPlugin;

impl Plugin for SitemapPlugin {
    fn name(&self) -> &str {
        "sitemap"
    }

    fn on_generated(&self, ctx: &GeneratedContext<'_>) -> Result<()> {
        if !ctx.config.sitemap.enabled {
            return Ok(());
        }

        let generator = SitemapGenerator::new(ctx.config);
        generator.write(ctx.pages, ctx.output_dir)?;
        Ok(())
    }
}

/// The plugins every Quire site uses.
pub fn default_plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(DiagramPlugin),
        Box::new(BlogPagePlugin),
        Box::new(PageCachePlugin),
        Box::new(FeedPlugin),
        Box::new(SitemapPlugin),
    ]
}
