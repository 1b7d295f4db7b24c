//! End-to-end tests for Quire.
//!
//! These tests build the sample site and verify its outputs.

use std::{fs, path::Path};

use quire_core::{Config, validate_nav};
use quire_generator::Builder;
use tempfile::TempDir;

const SITE_DIR: &str = "../../site";

fn load_site_config() -> Option<Config> {
    let config_path = Path::new(SITE_DIR).join("quire.toml");
    if !config_path.exists() {
        // Skip if running from a different working directory
        return None;
    }
    Some(Config::load(&config_path).expect("config should load"))
}

fn builder(config: Config, output: &TempDir, temp: &TempDir) -> Builder {
    let site = Path::new(SITE_DIR);
    Builder::new(config, site.join("content"), output.path())
        .with_static_dir(site.join("static"))
        .with_temp_dir(temp.path())
        .with_default_plugins()
}

#[test]
fn test_sample_site_config_loads() {
    let Some(config) = load_site_config() else {
        return;
    };

    assert_eq!(config.site.title, "Sierra Softworks Blog");
    assert_eq!(config.site.hostname, "https://sierrasoftworks.com");
    assert_eq!(config.site.lang, "en-GB");
    assert_eq!(config.analytics.google_id.as_deref(), Some("G-WJQ1PVYVH0"));

    let caches: Vec<&str> = config.cache.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(caches, vec!["posts", "projects", "licenses"]);
    assert!(config.cache[0].reverse);
}

#[test]
fn test_sample_site_navbar_resolves() {
    let Some(config) = load_site_config() else {
        return;
    };

    let output = TempDir::new().expect("output dir");
    let temp = TempDir::new().expect("temp dir");
    let (pages, skipped) = builder(config.clone(), &output, &temp)
        .collect_pages()
        .expect("collect");

    assert_eq!(skipped, 0);
    validate_nav(&config.theme.navbar, &pages).expect("navbar references exist");
}

#[test]
fn test_sample_site_builds() {
    let Some(config) = load_site_config() else {
        return;
    };

    let output = TempDir::new().expect("output dir");
    let temp = TempDir::new().expect("temp dir");
    let stats = builder(config, &output, &temp).build().expect("build");

    assert!(stats.pages >= 6, "expected at least 6 pages, got {}", stats.pages);
    assert_eq!(stats.skipped, 0);

    for file in ["index.html", "404.html", "sitemap.xml", "rss.xml", "atom.xml"] {
        assert!(output.path().join(file).exists(), "{file} should exist");
    }

    let posts = fs::read_to_string(temp.path().join("posts.js")).expect("posts.js");
    assert!(posts.starts_with("export const posts = ["));
    assert!(!posts.contains("posts/README.md"));

    let licenses = fs::read_to_string(temp.path().join("licenses.js")).expect("licenses.js");
    assert!(licenses.starts_with("export const licenses = ["));

    let rss = fs::read_to_string(output.path().join("rss.xml")).expect("rss.xml");
    assert!(rss.contains("Sierra Softworks"));
    assert!(!rss.contains("{year}"));
}

#[test]
fn test_sample_post_rendering() {
    let Some(config) = load_site_config() else {
        return;
    };

    let output = TempDir::new().expect("output dir");
    let temp = TempDir::new().expect("temp dir");
    builder(config, &output, &temp).build().expect("build");

    let post = fs::read_to_string(
        output
            .path()
            .join("posts/2024-01-26-be-right-nicely.html"),
    )
    .expect("post html");

    assert!(post.contains(r#"<article class="post">"#));
    assert!(post.contains("<ClientOnly><Mermaid"));
    assert!(post.contains(
        r#"<link href="https://sierrasoftworks.com/posts/2024-01-26-be-right-nicely.html" rel="canonical">"#
    ));
    assert!(post.contains(r#"<meta content="Benjamin Pannell" property="article:author">"#));
    assert!(post.contains("gtag/js?id=G-WJQ1PVYVH0"));
}
