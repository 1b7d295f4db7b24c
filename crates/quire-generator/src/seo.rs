//! Open Graph, Twitter card and article meta tags.

use quire_core::{Config, HeadTag, Page};

/// Summary length for `og:description` when a page has no description.
const SUMMARY_CHARS: usize = 160;

/// Builds per-page SEO head tags.
#[derive(Debug)]
pub struct SeoGenerator<'a> {
    config: &'a Config,
}

impl<'a> SeoGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Whether the page is tagged `og:type = article`.
    pub fn is_article(&self, page: &Page) -> bool {
        self.config
            .seo
            .article_prefixes
            .iter()
            .any(|prefix| page.is_under(prefix))
    }

    /// Head tags for a page; empty when SEO is disabled.
    pub fn head_tags(&self, page: &Page) -> Vec<HeadTag> {
        let seo = &self.config.seo;
        if !seo.enabled {
            return Vec::new();
        }

        let site = &self.config.site;
        let url = self.config.url_for(page.canonical_path());
        let summary = page.summary(SUMMARY_CHARS);
        let article = self.is_article(page);

        let mut tags = vec![
            og("og:url", &url),
            og("og:site_name", &site.title),
            og("og:title", &page.title),
            og("og:type", if article { "article" } else { "website" }),
            og("og:locale", &site.lang.replace('-', "_")),
            meta("twitter:card", "summary"),
            meta("twitter:title", &page.title),
        ];

        if !summary.is_empty() {
            tags.push(og("og:description", &summary));
            tags.push(meta("twitter:description", &summary));
        }

        if let Some(updated) = page.last_updated {
            tags.push(og("og:updated_time", &updated.to_rfc3339()));
        }

        if article {
            if let Some(author) = &seo.author {
                tags.push(og("article:author", &author.name));
            }
            if let Some(date) = page.date {
                tags.push(og("article:published_time", &format!("{date}T00:00:00Z")));
            }
            if let Some(updated) = page.last_updated {
                tags.push(og("article:modified_time", &updated.to_rfc3339()));
            }
            if let Some(tags_value) = page.frontmatter.get("tags").and_then(|v| v.as_array()) {
                for tag in tags_value.iter().filter_map(|t| t.as_str()) {
                    tags.push(og("article:tag", tag));
                }
            }
        }

        tags
    }
}

fn og(property: &str, content: &str) -> HeadTag {
    HeadTag::new("meta", [("property", property), ("content", content)])
}

fn meta(name: &str, content: &str) -> HeadTag {
    HeadTag::new("meta", [("name", name), ("content", content)])
}
