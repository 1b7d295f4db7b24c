//! New command - create a new post

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, Utc};
use color_eyre::eyre::{Result, WrapErr, bail};
use quire_core::Config;

use super::site_root;

/// Run the new command.
///
/// Creates `{section}/{date}-{slug}.md` in the content directory with
/// front-matter and an excerpt marker, returning its path.
pub fn run(
    config_path: &Path,
    title: &str,
    section: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<PathBuf> {
    tracing::info!(?config_path, title, ?section, "Creating new post");

    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    let section = section.unwrap_or_else(|| config.theme.post_prefix.trim_end_matches('/'));

    let slug = slugify(title);
    if slug.is_empty() {
        bail!("Title `{title}` does not produce a usable file name");
    }

    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let file_path = site_root(config_path)
        .join(&config.build.content_dir)
        .join(section)
        .join(format!("{}-{slug}.md", date.format("%Y-%m-%d")));

    if file_path.exists() {
        bail!("{} already exists", file_path.display());
    }

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).wrap_err("Failed to create directories")?;
    }

    fs::write(&file_path, post_template(title, &config.markdown.excerpt_marker))
        .wrap_err("Failed to write file")?;

    tracing::info!(?file_path, "Created new post");
    println!("Created: {}", file_path.display());

    Ok(file_path)
}

fn post_template(title: &str, excerpt_marker: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"---
title: "{escaped}"
description: ""
tags: []
---

# {title}

Summarise the post here; this paragraph becomes the excerpt.

{excerpt_marker}

Write the rest of your post here.
"#
    )
}

/// Lowercase ASCII alphanumerics joined by single hyphens.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
