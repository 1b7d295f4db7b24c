//! Quire Generator Library
//!
//! Static site generation engine for Quire.
//!
//! # Modules
//!
//! - [`collector`] - Content collection into pages
//! - [`plugin`] - Build hooks and the built-in blog plugins
//! - [`page_cache`] - Page cache data modules for the client bundle
//! - [`template`] - HTML template system with variable interpolation
//! - [`html`] - HTML generation from collected pages
//! - [`seo`] - Open Graph and Twitter meta tags
//! - [`feed`] - RSS and Atom feed generation
//! - [`sitemap`] - XML sitemap generation
//! - [`assets`] - Static asset copying
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod collector;
pub mod feed;
pub mod html;
pub mod page_cache;
pub mod plugin;
pub mod seo;
pub mod sitemap;
pub mod template;

pub use assets::AssetProcessor;
pub use build::{BuildError, BuildStats, Builder};
pub use collector::{CollectorError, ContentCollector, SiteContent};
pub use feed::FeedGenerator;
pub use html::HtmlGenerator;
pub use page_cache::{CacheEntry, CacheOptions, build_page_cache, extract_excerpt, write_page_cache};
pub use plugin::{
    BlogPagePlugin, DiagramPlugin, FeedPlugin, GeneratedContext, PageCachePlugin, Plugin,
    PrepareContext, SitemapPlugin, default_plugins,
};
pub use seo::SeoGenerator;
pub use sitemap::SitemapGenerator;
pub use template::{Template, TemplateContext, TemplateRegistry};
