//! Quire Core Library
//!
//! Core types, configuration, and error handling for the Quire blog generator.

pub mod config;
pub mod error;
pub mod frontmatter;
pub mod header;
pub mod nav;
pub mod page;

pub use config::{CacheConfig, Config};
pub use error::{CoreError, Result};
pub use frontmatter::Frontmatter;
pub use header::{PageHeader, fix_page_header, fix_page_headers, html_decode};
pub use nav::{NavItem, ResolvedNavItem, resolve_nav, validate_nav};
pub use page::{HeadTag, Page, PagePath};
