//! HTML templates with `{{ var }}` interpolation.
//!
//! `{{ name }}` is required, `{{ name? }}` renders as empty when unset.
//! Values are inserted verbatim; callers escape text before inserting it.

use std::collections::HashMap;

use thiserror::Error;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Variables available to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}

/// A named template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with the given context.
    ///
    /// Substituted values are never rescanned for placeholders.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut out = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let end = after_open.find("}}").ok_or_else(|| {
                TemplateError::InvalidSyntax(format!("unclosed {{{{ in template `{}`", self.name))
            })?;

            let key = after_open[..end].trim();
            let (key, optional) = match key.strip_suffix('?') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (key, false),
            };

            match context.get(key) {
                Some(value) => out.push_str(value),
                None if optional => {}
                None => return Err(TemplateError::MissingVariable(key.to_string())),
            }

            rest = &after_open[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Templates by name. Layout names from frontmatter select the inner
/// template; `base` wraps every page.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a registry with the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(Template::new("base", BASE_TEMPLATE));
        registry.register(Template::new("Layout", LAYOUT_TEMPLATE));
        registry.register(Template::new("BlogPost", BLOG_POST_TEMPLATE));
        registry.register(Template::new("NotFound", NOT_FOUND_TEMPLATE));
        registry
    }

    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Render a named template.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        self.get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?
            .render(context)
    }
}

/// Page shell shared by every layout.
pub const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }} | {{ site_title }}</title>
    {{ head }}
    <style>
        :root { --c-brand: #3eaf7c; --c-text: #2c3e50; --c-border: #eaecef; --c-code-bg: #f6f8fa; }
        body { margin: 0; font-family: system-ui, -apple-system, sans-serif; color: var(--c-text); line-height: 1.7; }
        .navbar { display: flex; align-items: center; gap: 1.5rem; padding: 0.75rem 1.5rem; border-bottom: 1px solid var(--c-border); }
        .navbar .logo { height: 2rem; }
        .navbar .site-name { font-weight: 600; color: inherit; text-decoration: none; }
        .navbar ul { list-style: none; display: flex; gap: 1rem; margin: 0 0 0 auto; padding: 0; }
        .navbar li { position: relative; }
        .navbar li ul { display: none; position: absolute; flex-direction: column; background: #fff; border: 1px solid var(--c-border); padding: 0.5rem 1rem; min-width: 12rem; }
        .navbar li:hover > ul { display: flex; }
        .navbar .nav-group-title { font-weight: 600; }
        main { max-width: 740px; margin: 0 auto; padding: 2rem 1.5rem; }
        a { color: var(--c-brand); }
        pre { padding: 1rem; border-radius: 6px; overflow-x: auto; }
        code { background: var(--c-code-bg); padding: 0.1rem 0.3rem; border-radius: 3px; }
        pre code { background: none; padding: 0; }
        .header-anchor { opacity: 0; text-decoration: none; }
        h2:hover .header-anchor, h3:hover .header-anchor { opacity: 1; }
        .page-meta { display: flex; justify-content: space-between; font-size: 0.9rem; color: #6a8bad; border-top: 1px solid var(--c-border); margin-top: 3rem; padding-top: 1rem; }
        .toc { font-size: 0.9rem; border-left: 2px solid var(--c-border); padding-left: 1rem; margin-bottom: 2rem; }
        .toc ul { list-style: none; padding-left: 1rem; margin: 0; }
        table { border-collapse: collapse; }
        th, td { border: 1px solid var(--c-border); padding: 0.4rem 0.8rem; }
    </style>
</head>
<body>
    <header class="navbar">
        <a href="/" class="site-name">{{ logo? }}{{ site_title }}</a>
        {{ navbar? }}
    </header>
    <main>
        {{ content }}
        {{ page_meta? }}
    </main>
</body>
</html>
"#;

/// Default layout for standalone pages.
pub const LAYOUT_TEMPLATE: &str = r#"<article class="page">
    {{ toc? }}
    <div class="content">
        {{ content }}
    </div>
</article>"#;

/// Layout for pages under the posts prefix.
pub const BLOG_POST_TEMPLATE: &str = r#"<article class="post">
    <header>
        <time datetime="{{ date_iso? }}">{{ date_formatted? }}</time>
    </header>
    {{ toc? }}
    <div class="content">
        {{ content }}
    </div>
</article>"#;

/// Body of `404.html`.
pub const NOT_FOUND_TEMPLATE: &str = r#"<article class="not-found">
    <h1>404</h1>
    <p>{{ message }}</p>
    <a href="/">Take me home</a>
</article>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_simple_render() {
        let template = Template::new("test", "Hello, {{ name }}!");
        let ctx = TemplateContext::new().with_var("name", "World");

        assert_eq!(template.render(&ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_template_optional_variable() {
        let template = Template::new("test", "Hello{{ suffix? }}!");

        assert_eq!(template.render(&TemplateContext::new()).unwrap(), "Hello!");

        let ctx = TemplateContext::new().with_var("suffix", ", World");
        assert_eq!(template.render(&ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let template = Template::new("test", "<code>{{ snippet }}</code>");
        let ctx = TemplateContext::new().with_var("snippet", "{{ name }}");

        assert_eq!(template.render(&ctx).unwrap(), "<code>{{ name }}</code>");
    }

    #[test]
    fn test_template_missing_required_variable() {
        let template = Template::new("test", "Hello, {{ name }}!");
        let result = template.render(&TemplateContext::new());

        assert!(matches!(result, Err(TemplateError::MissingVariable(name)) if name == "name"));
    }

    #[test]
    fn test_template_unclosed() {
        let template = Template::new("test", "Hello, {{ name");
        assert!(matches!(
            template.render(&TemplateContext::new()),
            Err(TemplateError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_template_registry() {
        let registry = TemplateRegistry::new();

        assert!(registry.get("base").is_some());
        assert!(registry.get("Layout").is_some());
        assert!(registry.get("BlogPost").is_some());
        assert!(matches!(
            registry.render("Special", &TemplateContext::new()),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_render_base_template() {
        let registry = TemplateRegistry::new();
        let ctx = TemplateContext::new()
            .with_var("lang", "en-GB")
            .with_var("title", "Archive")
            .with_var("site_title", "My Site")
            .with_var("head", "<link rel=\"icon\" href=\"/favicon.ico\">")
            .with_var("content", "<p>Hello!</p>");

        let result = registry.render("base", &ctx).unwrap();
        assert!(result.contains("<html lang=\"en-GB\">"));
        assert!(result.contains("<title>Archive | My Site</title>"));
        assert!(result.contains("<p>Hello!</p>"));
    }
}
