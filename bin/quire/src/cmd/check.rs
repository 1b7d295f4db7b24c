//! Check command - validate configuration and content

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use quire_core::{Config, validate_nav};
use quire_generator::{ContentCollector, extract_excerpt};
use quire_parser::MarkdownRenderer;

use super::site_root;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates configuration, every content file and the navbar.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let result = validate(config_path);

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Collect every problem with the site at `config_path`.
pub fn validate(config_path: &Path) -> ValidationResult {
    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = match Config::load_with_env(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            c
        }
        Err(e) => {
            println!("  ✗ Configuration invalid: {e}");
            result.add_error(format!("Configuration error: {e}"));
            return result;
        }
    };

    let root = site_root(config_path);
    let content_dir = root.join(&config.build.content_dir);
    if !content_dir.is_dir() {
        result.add_error(format!(
            "Content directory missing: {}",
            content_dir.display()
        ));
        return result;
    }

    println!("\nChecking content files...");
    let renderer = MarkdownRenderer::from_config(&config.markdown);
    let content = match ContentCollector::new(&config, &content_dir).collect(&renderer) {
        Ok(content) => content,
        Err(e) => {
            result.add_error(format!("Failed to read content: {e}"));
            return result;
        }
    };

    for skipped in &content.skipped {
        result.add_error(skipped.to_string());
    }
    if content.skipped.is_empty() {
        println!("  ✓ All {} content files valid", content.pages.len());
    } else {
        println!(
            "  ✗ {}/{} content files have errors",
            content.skipped.len(),
            content.pages.len() + content.skipped.len()
        );
    }

    println!("\nChecking navigation...");
    match validate_nav(&config.theme.navbar, &content.pages) {
        Ok(()) => println!("  ✓ Navbar references resolve"),
        Err(e) => {
            println!("  ✗ {e}");
            result.add_error(e.to_string());
        }
    }

    println!("\nChecking page caches...");
    for cache in &config.cache {
        let count = content
            .pages
            .iter()
            .filter(|page| page.is_under(&cache.prefix))
            .count();
        if count == 0 {
            result.add_warning(format!(
                "Cache `{}` matches no pages under `{}`",
                cache.name, cache.prefix
            ));
        }
    }

    let marker = &config.markdown.excerpt_marker;
    for page in content
        .pages
        .iter()
        .filter(|page| page.is_under(&config.theme.post_prefix))
        .filter(|page| !page.file_path_relative.as_deref().is_some_and(is_readme))
    {
        if extract_excerpt(&page.content_rendered, marker).is_none_or(str::is_empty) {
            result.add_warning(format!(
                "{} has no excerpt before `{marker}` and will not be listed",
                page.file_path_relative.as_deref().unwrap_or(&page.path)
            ));
        }
    }
    println!("  ✓ {} cache(s) checked", config.cache.len());

    let output = root.join(&config.build.output_dir);
    if output.exists() && !output.is_dir() {
        result.add_error(format!(
            "Output path exists but is not a directory: {}",
            output.display()
        ));
    }

    result
}

fn is_readme(relative: &str) -> bool {
    relative
        .rsplit('/')
        .next()
        .is_some_and(|name| name.eq_ignore_ascii_case("README.md"))
}
