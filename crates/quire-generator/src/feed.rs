//! RSS 2.0 and Atom feed generation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use atom_syndication::{
    Content as AtomContent, Entry, Feed, FixedDateTime, Link, Person, Text,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use quire_core::{Config, Page, config::Author};
use rss::{ChannelBuilder, GuidBuilder, ImageBuilder, Item, ItemBuilder};
use thiserror::Error;
use tracing::{debug, info};

use crate::page_cache::extract_excerpt;

/// Feed generation errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Feed generator for pages under the configured prefix.
#[derive(Debug)]
pub struct FeedGenerator<'a> {
    config: &'a Config,
}

impl<'a> FeedGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Feed pages, newest first, limited to `feed.limit`.
    ///
    /// The prefix's own `README.md` is not an item.
    pub fn items<'p>(&self, pages: &'p [Page]) -> Vec<&'p Page> {
        let prefix = &self.config.feed.prefix;
        let readme = format!("{}/README.md", prefix.trim_end_matches('/'));

        let mut items: Vec<&Page> = pages
            .iter()
            .filter(|page| page.is_under(prefix))
            .filter(|page| page.file_path_relative.as_deref() != Some(readme.as_str()))
            .collect();

        // Descending on `Option` leaves undated pages last.
        items.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.file_path_relative.cmp(&b.file_path_relative))
        });

        if let Some(limit) = self.config.feed.limit {
            items.truncate(limit);
        }
        items
    }

    /// Render the RSS 2.0 document.
    pub fn rss(&self, pages: &[Page]) -> String {
        let items: Vec<Item> = self
            .items(pages)
            .into_iter()
            .map(|page| self.rss_item(page))
            .collect();

        debug!(count = items.len(), "generating RSS feed");

        let site = &self.config.site;
        let channel_config = &self.config.feed.channel;

        let mut channel = ChannelBuilder::default();
        channel
            .title(&site.title)
            .link(&site.hostname)
            .description(site.description.as_deref().unwrap_or(&site.title))
            .language(Some(site.lang.clone()))
            .copyright(self.copyright())
            .last_build_date(Some(Utc::now().to_rfc2822()))
            .generator(Some("Quire".to_string()))
            .items(items);

        if let Some(icon) = &channel_config.icon {
            channel.image(Some(
                ImageBuilder::default()
                    .url(icon)
                    .title(&site.title)
                    .link(&site.hostname)
                    .build(),
            ));
        }

        channel.build().to_string()
    }

    /// Render the Atom document.
    pub fn atom(&self, pages: &[Page]) -> String {
        let site = &self.config.site;
        let items = self.items(pages);

        debug!(count = items.len(), "generating Atom feed");

        let mut feed = Feed::default();
        feed.set_title(site.title.as_str());
        if let Some(description) = &site.description {
            feed.set_subtitle(Some(Text::plain(description.as_str())));
        }
        feed.set_id(self.config.url_for("/"));
        feed.set_links(vec![
            Link {
                href: self.config.url_for("/atom.xml"),
                rel: "self".to_string(),
                mime_type: Some("application/atom+xml".to_string()),
                ..Default::default()
            },
            Link {
                href: self.config.url_for("/"),
                rel: "alternate".to_string(),
                mime_type: Some("text/html".to_string()),
                ..Default::default()
            },
        ]);
        feed.set_updated(
            items
                .iter()
                .find_map(|page| page_timestamp(page))
                .unwrap_or_else(|| Utc::now().fixed_offset()),
        );
        if let Some(copyright) = self.copyright() {
            feed.set_rights(Some(Text::plain(copyright)));
        }
        if let Some(icon) = &self.config.feed.channel.icon {
            feed.set_icon(Some(icon.clone()));
        }
        if let Some(author) = &self.config.feed.channel.author {
            feed.set_authors(vec![person(author)]);
        }
        feed.set_generator(Some(atom_syndication::Generator {
            value: "Quire".to_string(),
            ..Default::default()
        }));

        feed.set_entries(
            items
                .into_iter()
                .map(|page| self.atom_entry(page))
                .collect::<Vec<_>>(),
        );

        feed.to_string()
    }

    /// Write the enabled feeds into `output_dir`.
    pub fn write(&self, pages: &[Page], output_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        if self.config.feed.rss {
            let path = output_dir.join("rss.xml");
            fs::write(&path, self.rss(pages))?;
            info!(path = %path.display(), "generated RSS feed");
            written.push(path);
        }

        if self.config.feed.atom {
            let path = output_dir.join("atom.xml");
            fs::write(&path, self.atom(pages))?;
            info!(path = %path.display(), "generated Atom feed");
            written.push(path);
        }

        Ok(written)
    }

    fn rss_item(&self, page: &Page) -> Item {
        let url = self.config.url_for(page.canonical_path());
        let guid = GuidBuilder::default().value(&url).permalink(true).build();

        let mut builder = ItemBuilder::default();
        builder.title(Some(page.title.clone()));
        builder.link(Some(url));
        builder.guid(Some(guid));
        builder.content(Some(self.content(page).to_string()));

        if let Some(date) = page.date {
            builder.pub_date(Some(midnight(date).to_rfc2822()));
        }
        if let Some(description) = page.frontmatter.description() {
            builder.description(Some(description.to_string()));
        }

        builder.build()
    }

    fn atom_entry(&self, page: &Page) -> Entry {
        let url = self.config.url_for(page.canonical_path());

        let mut entry = Entry::default();
        entry.set_title(page.title.as_str());
        entry.set_id(url.clone());
        entry.set_links(vec![Link {
            href: url,
            rel: "alternate".to_string(),
            mime_type: Some("text/html".to_string()),
            ..Default::default()
        }]);

        let updated = page_timestamp(page).unwrap_or_else(|| Utc::now().fixed_offset());
        entry.set_updated(updated);
        if let Some(date) = page.date {
            entry.set_published(Some(midnight(date).fixed_offset()));
        }

        let mut content = AtomContent::default();
        content.set_value(Some(self.content(page).to_string()));
        content.set_content_type(Some("html".to_string()));
        entry.set_content(Some(content));

        if let Some(author) = &self.config.feed.channel.author {
            entry.set_authors(vec![person(author)]);
        }

        entry
    }

    /// Item content is the page excerpt, or empty when it has none.
    fn content<'p>(&self, page: &'p Page) -> &'p str {
        extract_excerpt(&page.content_rendered, &self.config.markdown.excerpt_marker)
            .unwrap_or_default()
    }

    /// Channel copyright with `{year}` replaced by the current UTC year.
    fn copyright(&self) -> Option<String> {
        self.config
            .feed
            .channel
            .copyright
            .as_ref()
            .map(|c| c.replace("{year}", &Utc::now().year().to_string()))
    }
}

fn person(author: &Author) -> Person {
    Person {
        name: author.name.clone(),
        uri: author.url.clone(),
        ..Default::default()
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

fn page_timestamp(page: &Page) -> Option<FixedDateTime> {
    page.frontmatter
        .updated()
        .or(page.date)
        .map(|d| midnight(d).fixed_offset())
        .or_else(|| page.last_updated.map(|d| d.fixed_offset()))
}
