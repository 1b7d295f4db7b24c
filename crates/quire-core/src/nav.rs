//! Navigation tree declared in the theme configuration.
//!
//! Entries refer to pages by their source path (`/archive.md`), group other
//! entries under a label, or point at an external URL.

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    page::{Page, PagePath},
};

/// A navbar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavItem {
    /// Link to a page by source path.
    Page(String),

    /// Labelled group of entries.
    Group { text: String, children: Vec<NavItem> },

    /// External link.
    Link { text: String, link: String },
}

impl NavItem {
    /// Every page reference in this entry and its descendants, in order.
    pub fn links(&self) -> Vec<&str> {
        let mut links = Vec::new();
        self.collect_links(&mut links);
        links
    }

    fn collect_links<'a>(&'a self, links: &mut Vec<&'a str>) {
        match self {
            Self::Page(path) => links.push(path),
            Self::Group { children, .. } => {
                for child in children {
                    child.collect_links(links);
                }
            }
            Self::Link { .. } => {}
        }
    }
}

/// A navbar entry with page references resolved to titles and output paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNavItem {
    pub text: String,
    pub link: Option<String>,
    pub external: bool,
    pub children: Vec<ResolvedNavItem>,
}

/// Report page references that match no page's source path.
pub fn validate_nav(items: &[NavItem], pages: &[Page]) -> Result<()> {
    let missing: Vec<&str> = items
        .iter()
        .flat_map(NavItem::links)
        .filter(|link| find_page(pages, link).is_none())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::navigation(format!(
            "navbar references missing pages: {}",
            missing.join(", ")
        )))
    }
}

/// Resolve a navbar against the page list.
///
/// Unknown page references keep their raw path as text and link to the
/// inferred output path.
pub fn resolve_nav(items: &[NavItem], pages: &[Page]) -> Vec<ResolvedNavItem> {
    items.iter().map(|item| resolve_item(item, pages)).collect()
}

fn resolve_item(item: &NavItem, pages: &[Page]) -> ResolvedNavItem {
    match item {
        NavItem::Page(reference) => match find_page(pages, reference) {
            Some(page) => ResolvedNavItem {
                text: page.title.clone(),
                link: Some(page.path.clone()),
                external: false,
                children: Vec::new(),
            },
            None => ResolvedNavItem {
                text: reference.clone(),
                link: Some(PagePath::from_relative(reference).path_inferred),
                external: false,
                children: Vec::new(),
            },
        },
        NavItem::Group { text, children } => ResolvedNavItem {
            text: text.clone(),
            link: None,
            external: false,
            children: resolve_nav(children, pages),
        },
        NavItem::Link { text, link } => ResolvedNavItem {
            text: text.clone(),
            link: Some(link.clone()),
            external: true,
            children: Vec::new(),
        },
    }
}

fn find_page<'a>(pages: &'a [Page], reference: &str) -> Option<&'a Page> {
    let relative = reference.trim_start_matches('/');
    pages
        .iter()
        .find(|page| page.file_path_relative.as_deref() == Some(relative))
}
