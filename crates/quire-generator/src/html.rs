//! HTML generation from collected pages.
//!
//! Renders each page's layout template and wraps it in the shared shell.

use std::path::{Path, PathBuf};

use quire_core::{Config, HeadTag, Page, PageHeader, ResolvedNavItem, resolve_nav};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    seo::SeoGenerator,
    template::{Template, TemplateContext, TemplateError, TemplateRegistry},
};

/// KaTeX stylesheet added when math rendering is enabled.
const KATEX_CSS: &str = "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css";

/// HTML generation errors.
#[derive(Debug, Error)]
pub enum HtmlError {
    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for HTML generation.
pub type Result<T> = std::result::Result<T, HtmlError>;

/// HTML page generator.
#[derive(Debug)]
pub struct HtmlGenerator<'a> {
    config: &'a Config,
    templates: TemplateRegistry,
    seo: SeoGenerator<'a>,
    /// Navbar markup, identical on every page.
    navbar: String,
}

impl<'a> HtmlGenerator<'a> {
    /// Create a generator; `pages` resolves navbar page references.
    #[must_use]
    pub fn new(config: &'a Config, pages: &[Page]) -> Self {
        Self::with_templates(config, pages, TemplateRegistry::new())
    }

    /// Create a generator with custom templates.
    #[must_use]
    pub fn with_templates(config: &'a Config, pages: &[Page], templates: TemplateRegistry) -> Self {
        let nav = resolve_nav(&config.theme.navbar, pages);
        let navbar = navbar_html(&nav, config);

        Self {
            config,
            templates,
            seo: SeoGenerator::new(config),
            navbar,
        }
    }

    /// Register a custom template.
    pub fn register_template(&mut self, template: Template) {
        self.templates.register(template);
    }

    /// Generate the full HTML document for a page.
    pub fn generate_page(&self, page: &Page) -> Result<String> {
        debug!(path = %page.path, "generating HTML for page");

        let layout = self.layout_for(page);
        let mut inner = TemplateContext::new().with_var("content", &page.content_rendered);

        let toc = toc_html(&page.headers);
        if !toc.is_empty() {
            inner.insert("toc", toc);
        }
        if let Some(date) = page.date {
            inner.insert("date_iso", date.format("%Y-%m-%d").to_string());
            inner.insert("date_formatted", date.format("%-d %B %Y").to_string());
        }

        let inner_html = self.templates.render(layout, &inner)?;

        let mut base = self
            .base_context(&page.title, &inner_html)
            .with_var("head", self.head_html(page));
        let meta = self.page_meta_html(page);
        if !meta.is_empty() {
            base.insert("page_meta", meta);
        }

        Ok(self.templates.render("base", &base)?)
    }

    /// Generate `404.html`.
    pub fn generate_not_found(&self) -> Result<String> {
        let inner = TemplateContext::new().with_var("message", "That page could not be found.");
        let inner_html = self.templates.render("NotFound", &inner)?;

        let head: String = self
            .config
            .site
            .head
            .iter()
            .map(HeadTag::render)
            .collect::<Vec<_>>()
            .join("\n    ");
        let base = self
            .base_context("Page not found", &inner_html)
            .with_var("head", head);

        Ok(self.templates.render("base", &base)?)
    }

    /// Output file for a page's path.
    ///
    /// `/` and `/dir/` become `index.html` files; `.html` paths are kept; any
    /// other path becomes a directory with an `index.html`.
    pub fn output_path(&self, page: &Page, output_dir: &Path) -> PathBuf {
        let path = page.path.trim_start_matches('/');

        if path.is_empty() || path.ends_with('/') {
            output_dir.join(path).join("index.html")
        } else if path.ends_with(".html") {
            output_dir.join(path)
        } else {
            output_dir.join(path).join("index.html")
        }
    }

    fn layout_for<'p>(&'p self, page: &'p Page) -> &'p str {
        match page.frontmatter.layout() {
            Some(layout) if self.templates.get(layout).is_some() => layout,
            Some(layout) => {
                warn!(layout, path = %page.path, "unknown layout, using default");
                &self.config.theme.default_layout
            }
            None => &self.config.theme.default_layout,
        }
    }

    fn base_context(&self, title: &str, content: &str) -> TemplateContext {
        let site = &self.config.site;
        let mut ctx = TemplateContext::new()
            .with_var("lang", &site.lang)
            .with_var("title", escape_html(title))
            .with_var("site_title", escape_html(&site.title))
            .with_var("content", content);

        if !self.navbar.is_empty() {
            ctx.insert("navbar", &self.navbar);
        }
        if let Some(logo) = &self.config.theme.logo {
            ctx.insert("logo", logo_html(logo, self.config.theme.logo_dark.as_deref()));
        }
        ctx
    }

    /// Site head tags, then front-matter head tags, then SEO and analytics.
    fn head_html(&self, page: &Page) -> String {
        let mut tags: Vec<HeadTag> = self.config.site.head.clone();
        tags.extend(page.frontmatter.head().iter().filter_map(HeadTag::from_value));
        tags.extend(self.seo.head_tags(page));

        if let Some(description) = page.frontmatter.description() {
            tags.push(HeadTag::new(
                "meta",
                [("name", "description"), ("content", description)],
            ));
        }
        if self.config.markdown.math {
            tags.push(HeadTag::new("link", [("rel", "stylesheet"), ("href", KATEX_CSS)]));
        }

        let mut html: Vec<String> = tags.iter().map(HeadTag::render).collect();
        if let Some(id) = &self.config.analytics.google_id {
            html.push(analytics_html(id));
        }
        html.join("\n    ")
    }

    fn page_meta_html(&self, page: &Page) -> String {
        let theme = &self.config.theme;
        let mut parts = Vec::new();

        if let (Some(repo), Some(relative)) = (&theme.docs_repo, &page.file_path_relative) {
            let href = format!(
                "https://github.com/{repo}/edit/{}/{}/{relative}",
                theme.docs_branch,
                theme.docs_dir.trim_matches('/')
            );
            parts.push(format!(
                r#"<a class="edit-link" href="{}">{}</a>"#,
                escape_html(&href),
                escape_html(&theme.edit_link_text)
            ));
        }

        if theme.last_updated
            && let Some(updated) = page.last_updated
        {
            parts.push(format!(
                r#"<span class="last-updated">Last updated: <time datetime="{}">{}</time></span>"#,
                updated.to_rfc3339(),
                updated.format("%-d %B %Y")
            ));
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!(r#"<footer class="page-meta">{}</footer>"#, parts.join(""))
        }
    }
}

fn navbar_html(items: &[ResolvedNavItem], config: &Config) -> String {
    let mut html = String::new();
    for item in items {
        html.push_str(&nav_item_html(item));
    }

    if let Some(repo) = &config.theme.repo {
        let href = if repo.contains("://") {
            repo.clone()
        } else {
            format!("https://github.com/{repo}")
        };
        html.push_str(&format!(
            r#"<li><a href="{}" class="repo-link" target="_blank" rel="noopener noreferrer">{}</a></li>"#,
            escape_html(&href),
            escape_html(&config.theme.repo_label)
        ));
    }

    if html.is_empty() {
        html
    } else {
        format!("<nav><ul>{html}</ul></nav>")
    }
}

fn nav_item_html(item: &ResolvedNavItem) -> String {
    let text = escape_html(&item.text);
    let label = match &item.link {
        Some(link) if item.external => format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{text}</a>"#,
            escape_html(link)
        ),
        Some(link) => format!(r#"<a href="{}">{text}</a>"#, escape_html(link)),
        None => format!(r#"<span class="nav-group-title">{text}</span>"#),
    };

    if item.children.is_empty() {
        format!("<li>{label}</li>")
    } else {
        let children: String = item.children.iter().map(nav_item_html).collect();
        format!("<li>{label}<ul>{children}</ul></li>")
    }
}

fn logo_html(logo: &str, logo_dark: Option<&str>) -> String {
    match logo_dark {
        Some(dark) => format!(
            r#"<picture><source srcset="{}" media="(prefers-color-scheme: dark)"><img class="logo" src="{}" alt=""></picture>"#,
            escape_html(dark),
            escape_html(logo)
        ),
        None => format!(r#"<img class="logo" src="{}" alt="">"#, escape_html(logo)),
    }
}

fn analytics_html(id: &str) -> String {
    let id = escape_html(id);
    format!(
        r#"<script async src="https://www.googletagmanager.com/gtag/js?id={id}"></script>
    <script>window.dataLayer = window.dataLayer || []; function gtag(){{dataLayer.push(arguments);}} gtag('js', new Date()); gtag('config', '{id}');</script>"#
    )
}

/// Table of contents from the header tree.
fn toc_html(headers: &[PageHeader]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    fn list(headers: &[PageHeader]) -> String {
        let mut html = String::from("<ul>");
        for header in headers {
            html.push_str(&format!(
                r#"<li><a href="{}">{}</a>"#,
                escape_html(&header.link),
                escape_text(&header.title)
            ));
            if !header.children.is_empty() {
                html.push_str(&list(&header.children));
            }
            html.push_str("</li>");
        }
        html.push_str("</ul>");
        html
    }

    format!(r#"<nav class="toc">{}</nav>"#, list(headers))
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape text that may already hold character references.
///
/// Header titles keep `&lt;` and `&gt;` after the fixup, so an `&` that
/// starts a reference is left alone.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' if is_char_ref(&s[i + 1..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether `rest` (the text after an `&`) opens a named or numeric reference.
fn is_char_ref(rest: &str) -> bool {
    let Some((name, _)) = rest.split_once(';') else {
        return false;
    };
    match name.strip_prefix('#') {
        Some(num) => match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        },
        None => !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric()),
    }
}
