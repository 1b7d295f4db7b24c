//! Build command - generates the static site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr, bail};
use quire_core::Config;
use quire_generator::{BuildStats, Builder};

use super::site_root;

/// Run the build command.
///
/// Content, static and output directories come from the configuration and
/// resolve relative to the configuration file. `output` and `hostname`
/// override the configured values.
pub fn run(config_path: &Path, output: Option<&Path>, hostname: Option<&str>) -> Result<BuildStats> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, ?hostname, "Starting build");

    let mut config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    if let Some(h) = hostname {
        tracing::info!(hostname = h, "Overriding site hostname from CLI");
        config.site.hostname = h.to_string();
        if let Err(e) = config.validate() {
            bail!("Invalid hostname override: {e}");
        }
    }

    tracing::debug!(?config, "Loaded configuration");

    let root = site_root(config_path);
    let content_dir = root.join(&config.build.content_dir);
    let output_dir = output.map_or_else(|| root.join(&config.build.output_dir), Path::to_path_buf);
    let static_dir = root.join(&config.build.static_dir);

    let mut builder = Builder::new(config, &content_dir, &output_dir).with_default_plugins();
    if static_dir.is_dir() {
        tracing::info!("Found static directory, will copy to output");
        builder = builder.with_static_dir(&static_dir);
    }

    let stats = builder.build().wrap_err("Build failed")?;
    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:    {}", stats.pages);
    if stats.skipped > 0 {
        println!("  Skipped:  {} (run `quire check` for details)", stats.skipped);
    }
    println!("  Assets:   {}", stats.assets);
    println!();
    println!("  Duration: {:.2}s", duration.as_secs_f64());
    println!("  Output:   {}", output_dir.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_site(root: &Path) {
        fs::write(
            root.join("quire.toml"),
            r#"
[site]
title = "Test Blog"
hostname = "https://example.com"

[[cache]]
name = "posts"
prefix = "posts/"
"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("content/posts")).unwrap();
        fs::write(root.join("content/README.md"), "# Home\n").unwrap();
        fs::write(
            root.join("content/posts/2024-01-26-hello.md"),
            "# Hello\n\nIntro\n\n<!-- more -->\n\nRest\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("static")).unwrap();
        fs::write(root.join("static/favicon.ico"), "icon").unwrap();
    }

    #[test]
    fn test_build_resolves_paths_from_config_dir() {
        let dir = TempDir::new().unwrap();
        write_site(dir.path());

        let stats = run(&dir.path().join("quire.toml"), None, None).unwrap();

        assert_eq!(stats.pages, 2);
        assert_eq!(stats.assets, 1);
        assert!(dir.path().join("public/index.html").exists());
        assert!(dir.path().join("public/favicon.ico").exists());
        assert!(dir.path().join("content/.temp/posts.js").exists());
    }

    #[test]
    fn test_build_overrides() {
        let dir = TempDir::new().unwrap();
        write_site(dir.path());
        let out = dir.path().join("dist");

        run(
            &dir.path().join("quire.toml"),
            Some(&out),
            Some("https://staging.example.com"),
        )
        .unwrap();

        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("https://staging.example.com/"));
    }

    #[test]
    fn test_build_rejects_bad_hostname() {
        let dir = TempDir::new().unwrap();
        write_site(dir.path());

        assert!(run(&dir.path().join("quire.toml"), None, Some("example.com")).is_err());
    }
}
