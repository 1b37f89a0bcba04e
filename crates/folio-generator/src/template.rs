//! Template loading and rendering.
//!
//! Templates are Jinja-style files loaded with Tera from the templates
//! directory. Template names are paths relative to that directory, using `/`
//! as separator (`page.html`, `partials/nav.html`). Output is never
//! auto-escaped: page bodies are already HTML.
//!
//! A template that does not parse, or extends or imports one that is not
//! available, is kept out of the set. Its error is raised when the template is
//! resolved, so an unused broken file does not stop a build.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use folio_core::{Config, PageRecord, ProjectEntry, ProjectPage};
use serde::Serialize;
use tera::{Context, Template, Tera};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension of template files.
pub const TEMPLATE_EXTENSION: &str = "html";

/// Template errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),

    /// A template failed while rendering.
    #[error("failed to render {name}: {message}")]
    Render { name: String, message: String },

    /// A value could not be exposed to templates.
    #[error("invalid template context value {key}: {message}")]
    Context { key: String, message: String },

    /// IO error while loading templates.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal error.
    #[error("failed to walk templates directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template set for one build.
#[derive(Debug)]
pub struct TemplateEngine {
    tera: Tera,
    /// Templates left out of `tera`, with the reason.
    broken: BTreeMap<String, String>,
}

impl TemplateEngine {
    /// Load every `*.html` file under `dir`.
    ///
    /// A missing directory yields an engine without templates, so only
    /// rendering fails.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "templates directory does not exist");
            return Self::from_templates(Vec::<(String, String)>::new());
        }

        let mut templates = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().is_none_or(|ext| ext != TEMPLATE_EXTENSION)
            {
                continue;
            }

            let Some(name) = template_name(dir, path) else {
                warn!(path = %path.display(), "skipping template with non UTF-8 name");
                continue;
            };
            let source = fs::read_to_string(path).map_err(|source| TemplateError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            debug!(name = %name, "loaded template");
            templates.push((name, source));
        }

        info!(dir = %dir.display(), count = templates.len(), "loaded templates");
        Self::from_templates(templates)
    }

    /// Build an engine from in-memory `(name, source)` pairs.
    pub fn from_templates<I, N, S>(templates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut parsed = BTreeMap::new();
        let mut broken = BTreeMap::new();
        for (name, source) in templates {
            let (name, source) = (name.as_ref(), source.as_ref());
            match Template::new(name, None, source) {
                Ok(template) => {
                    parsed.insert(name.to_string(), (source.to_string(), template));
                }
                Err(e) => {
                    broken.insert(name.to_string(), describe(&e));
                }
            }
        }
        drop_unresolvable(&mut parsed, &mut broken);

        for (name, reason) in &broken {
            warn!(template = %name, %reason, "template is unusable");
        }

        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_templates(parsed.iter().map(|(name, (source, _))| (name, source)))
            .map_err(|e| TemplateError::InvalidSyntax(describe(&e)))?;

        Ok(Self { tera, broken })
    }

    /// Whether a template with this name was loaded.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Look up a template by name.
    ///
    /// A template that failed to load reports its error here.
    pub fn resolve(&self, name: &str) -> Result<&str> {
        if let Some(reason) = self.broken.get(name) {
            return Err(TemplateError::InvalidSyntax(format!("{name}: {reason}")));
        }
        self.tera
            .get_template_names()
            .find(|n| *n == name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    /// Names of all loaded templates, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Render a template with an explicit context.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        let name = self.resolve(name)?;
        self.tera
            .render(name, context)
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                message: describe(&e),
            })
    }

    /// Render a content page with the shared site context.
    pub fn render_page(&self, page: &PageRecord, site: &Context) -> Result<String> {
        let mut context = site.clone();
        insert(&mut context, "page", page)?;
        self.render(page.template(), &context)
    }

    /// Render a project page with the shared site context.
    ///
    /// `pages` stays bound so a project falling back to `page.html` can
    /// still build its navigation.
    pub fn render_project(
        &self,
        name: &str,
        page: &ProjectPage,
        project: &ProjectEntry,
        site: &Context,
    ) -> Result<String> {
        let mut context = site.clone();
        insert(&mut context, "page", page)?;
        insert(&mut context, "project", project)?;
        self.render(name, &context)
    }
}

/// Context shared by every content page: `config` and the ordered `pages`.
pub fn site_context(config: &Config, pages: &[PageRecord]) -> Result<Context> {
    let mut context = Context::new();
    insert(&mut context, "config", config)?;
    insert(&mut context, "pages", pages)?;
    Ok(context)
}

fn insert<T: Serialize + ?Sized>(context: &mut Context, key: &str, value: &T) -> Result<()> {
    context
        .try_insert(key, value)
        .map_err(|e| TemplateError::Context {
            key: key.to_string(),
            message: describe(&e),
        })
}

/// Parsed template with its source.
type Parsed = (String, Template);

/// Move templates whose parent or macro imports are unavailable into `broken`,
/// until every remaining template can be loaded.
fn drop_unresolvable(
    parsed: &mut BTreeMap<String, Parsed>,
    broken: &mut BTreeMap<String, String>,
) {
    loop {
        let available: &BTreeMap<String, Parsed> = parsed;
        let failed: Vec<_> = available
            .iter()
            .filter_map(|(name, (_, template))| {
                unresolved(name, template, available).map(|reason| (name.clone(), reason))
            })
            .collect();
        if failed.is_empty() {
            return;
        }
        for (name, reason) in failed {
            parsed.remove(&name);
            broken.insert(name, reason);
        }
    }
}

fn unresolved(
    name: &str,
    template: &Template,
    parsed: &BTreeMap<String, Parsed>,
) -> Option<String> {
    if let Some(parent) = template.parent.as_ref().filter(|p| !parsed.contains_key(*p)) {
        return Some(format!("extends unavailable template `{parent}`"));
    }
    if let Some((file, _)) = template
        .imported_macro_files
        .iter()
        .find(|(file, _)| !parsed.contains_key(file))
    {
        return Some(format!("imports macros from unavailable template `{file}`"));
    }

    let mut seen = BTreeSet::from([name]);
    let mut current = template;
    while let Some(parent) = &current.parent {
        if !seen.insert(parent.as_str()) {
            return Some(format!("circular extends through `{parent}`"));
        }
        match parsed.get(parent) {
            Some((_, next)) => current = next,
            None => break,
        }
    }
    None
}

/// Relative template name with `/` separators.
fn template_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Tera keeps the useful detail in the error chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, path::Path};

    use folio_core::ParsedContent;
    use tempfile::TempDir;

    use super::*;

    fn page(path: &str, html: &str) -> PageRecord {
        PageRecord::from_parsed(
            Path::new(path),
            String::new(),
            ParsedContent {
                html: html.to_string(),
                ..ParsedContent::default()
            },
            BTreeMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_load_nested_templates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("partials")).unwrap();
        fs::write(
            dir.path().join("page.html"),
            "{% include \"partials/nav.html\" %}{{ page.content }}",
        )
        .unwrap();
        fs::write(dir.path().join("partials/nav.html"), "<nav></nav>").unwrap();
        fs::write(dir.path().join("README.md"), "not a template").unwrap();

        let engine = TemplateEngine::load(dir.path()).unwrap();

        assert_eq!(engine.names(), vec!["page.html", "partials/nav.html"]);
        assert!(!engine.has_template("README.md"));

        let site = site_context(&Config::default(), &[]).unwrap();
        let html = engine.render_page(&page("about.md", "<p>x</p>"), &site).unwrap();
        assert_eq!(html, "<nav></nav><p>x</p>");
    }

    #[test]
    fn test_missing_directory_has_no_templates() {
        let dir = TempDir::new().unwrap();
        let engine = TemplateEngine::load(&dir.path().join("nope")).unwrap();

        assert!(engine.names().is_empty());
        assert!(matches!(
            engine.resolve("page.html"),
            Err(TemplateError::NotFound(name)) if name == "page.html"
        ));
    }

    #[test]
    fn test_syntax_error_is_reported_on_resolve() {
        let engine = TemplateEngine::from_templates([
            ("page.html", "{{ page.content }}"),
            ("draft.html", "{% if %}"),
        ])
        .unwrap();

        assert_eq!(engine.names(), vec!["page.html"]);
        assert!(!engine.has_template("draft.html"));
        assert!(matches!(
            engine.resolve("draft.html"),
            Err(TemplateError::InvalidSyntax(message)) if message.starts_with("draft.html")
        ));

        let site = site_context(&Config::default(), &[]).unwrap();
        let html = engine.render_page(&page("a.md", "<p>ok</p>"), &site).unwrap();
        assert_eq!(html, "<p>ok</p>");
    }

    #[test]
    fn test_children_of_unavailable_parent_are_unusable() {
        let engine = TemplateEngine::from_templates([
            ("base.html", "{% block body %}"),
            ("page.html", "{% extends \"base.html\" %}{% block body %}x{% endblock %}"),
            ("orphan.html", "{% extends \"missing.html\" %}"),
            ("macros.html", "{% import \"nope.html\" as m %}"),
            ("standalone.html", "ok"),
        ])
        .unwrap();

        assert_eq!(engine.names(), vec!["standalone.html"]);
        for name in ["base.html", "page.html", "orphan.html", "macros.html"] {
            assert!(
                matches!(engine.resolve(name), Err(TemplateError::InvalidSyntax(_))),
                "{name} should be unusable"
            );
        }
    }

    #[test]
    fn test_circular_extends_is_unusable() {
        let engine = TemplateEngine::from_templates([
            ("a.html", "{% extends \"b.html\" %}"),
            ("b.html", "{% extends \"a.html\" %}"),
            ("page.html", "fine"),
        ])
        .unwrap();

        assert_eq!(engine.resolve("page.html").unwrap(), "page.html");
        assert!(matches!(
            engine.resolve("a.html"),
            Err(TemplateError::InvalidSyntax(message)) if message.contains("circular")
        ));
        assert!(matches!(engine.resolve("b.html"), Err(TemplateError::InvalidSyntax(_))));
    }

    #[test]
    fn test_content_is_not_escaped() {
        let engine =
            TemplateEngine::from_templates([("page.html", "<main>{{ page.content }}</main>")])
                .unwrap();
        let site = site_context(&Config::default(), &[]).unwrap();

        let html = engine
            .render_page(&page("a.md", "<p><strong>bold</strong></p>"), &site)
            .unwrap();

        assert_eq!(html, "<main><p><strong>bold</strong></p></main>");
    }

    #[test]
    fn test_site_bindings() {
        let engine = TemplateEngine::from_templates([(
            "page.html",
            "{{ config.site_name }}|{% for p in pages %}{{ p.slug }},{% endfor %}|{{ page.meta.title | default(value=\"\") }}",
        )])
        .unwrap();
        let config = Config::from_yaml("site_name: Folio\n", Path::new("config.yaml")).unwrap();
        let pages = vec![page("index.md", ""), page("about.md", "")];
        let site = site_context(&config, &pages).unwrap();

        let html = engine.render_page(&pages[1], &site).unwrap();

        assert_eq!(html, "Folio|index,about,|");
    }

    #[test]
    fn test_undefined_variable_is_render_error() {
        let engine = TemplateEngine::from_templates([("page.html", "{{ nope.field }}")]).unwrap();
        let result = engine.render("page.html", &Context::new());

        assert!(matches!(result, Err(TemplateError::Render { name, .. }) if name == "page.html"));
    }

    #[test]
    fn test_render_project_bindings() {
        let engine = TemplateEngine::from_templates([(
            "project.html",
            "{{ page.meta.title }}:{{ project.slug }}:{{ project.stack }}:{{ page.content }}",
        )])
        .unwrap();
        let config = Config::from_yaml(
            "personal_work:\n  - slug: cc\n    title: Compiler\n    stack: rust\n",
            Path::new("config.yaml"),
        )
        .unwrap();
        let project = &config.personal_work[0];
        let site = site_context(&config, &[]).unwrap();

        let html = engine
            .render_project(
                "project.html",
                &ProjectPage::new("<p>body</p>", "Compiler"),
                project,
                &site,
            )
            .unwrap();

        assert_eq!(html, "Compiler:cc:rust:<p>body</p>");
    }

    #[test]
    fn test_template_name_uses_forward_slashes() {
        let root = Path::new("/t");
        assert_eq!(
            template_name(root, &root.join("a").join("b.html")).as_deref(),
            Some("a/b.html")
        );
    }
}
