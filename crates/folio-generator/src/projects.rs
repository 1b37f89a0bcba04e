//! Project detail pages from `personal_work` entries.
//!
//! Each entry with a slug gets `projects/<slug>.html`. The body comes from
//! `<content>/projects/<slug>.md` when that file exists and from a generated
//! placeholder otherwise.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use folio_core::{Config, PageRecord, ProjectEntry, ProjectPage};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    collector::{CollectorError, ContentCollector},
    template::{self, TemplateEngine, TemplateError},
};

/// Directory holding project pages, in both content and output trees.
pub const PROJECTS_DIR: &str = "projects";

/// Preferred template for project pages.
pub const PROJECT_TEMPLATE: &str = "project.html";

/// Template used when [`PROJECT_TEMPLATE`] is unavailable.
pub const FALLBACK_TEMPLATE: &str = "page.html";

/// Project page errors.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// IO error.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A project content file failed to load.
    #[error(transparent)]
    Collector(#[from] CollectorError),

    /// Template error.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Result type for project page operations.
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Renders one page per `personal_work` entry.
#[derive(Debug)]
pub struct ProjectPageGenerator<'a> {
    collector: &'a ContentCollector,
    templates: &'a TemplateEngine,
    output_dir: &'a Path,
}

impl<'a> ProjectPageGenerator<'a> {
    /// Create a generator writing below `output_dir`.
    #[must_use]
    pub fn new(
        collector: &'a ContentCollector,
        templates: &'a TemplateEngine,
        output_dir: &'a Path,
    ) -> Self {
        Self {
            collector,
            templates,
            output_dir,
        }
    }

    /// Write all project pages, returning their paths in configuration order.
    ///
    /// `pages` are the collected content pages, bound as `pages` in templates.
    pub fn generate(&self, config: &Config, pages: &[PageRecord]) -> Result<Vec<PathBuf>> {
        if config.personal_work.is_empty() {
            return Ok(Vec::new());
        }

        let dir = self.output_dir.join(PROJECTS_DIR);
        fs::create_dir_all(&dir).map_err(|source| ProjectError::Io {
            path: dir.clone(),
            source,
        })?;

        let name = self.template()?;
        let site = template::site_context(config, pages)?;
        debug!(template = name, "rendering project pages");

        let mut written = Vec::new();
        for entry in &config.personal_work {
            let Some(slug) = entry.slug() else {
                debug!(title = entry.title(), "skipping project without slug");
                continue;
            };

            let page = self.project_page(entry, slug)?;
            let html = self.templates.render_project(name, &page, entry, &site)?;

            let path = dir.join(format!("{slug}.html"));
            fs::write(&path, html).map_err(|source| ProjectError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "wrote project page");
            written.push(path);
        }

        info!(count = written.len(), "generated project pages");
        Ok(written)
    }

    /// `project.html` if it exists and loaded, else `page.html`.
    fn template(&self) -> Result<&'a str> {
        match self.templates.resolve(PROJECT_TEMPLATE) {
            Ok(name) => Ok(name),
            Err(e) => {
                debug!(error = %e, "falling back to {FALLBACK_TEMPLATE}");
                Ok(self.templates.resolve(FALLBACK_TEMPLATE)?)
            }
        }
    }

    /// Page body and title for one entry.
    ///
    /// A content file's own `title` overrides the configured one.
    pub fn project_page(&self, entry: &ProjectEntry, slug: &str) -> Result<ProjectPage> {
        let path = project_content_dir(self.collector.content_dir()).join(format!("{slug}.md"));

        if path.is_file() {
            let record = self.collector.load_page(&path)?;
            let title = record
                .meta
                .title
                .clone()
                .unwrap_or_else(|| entry.title().to_string());
            return Ok(ProjectPage::new(record.content, title));
        }

        Ok(ProjectPage::new(
            placeholder_html(entry, slug),
            entry.title(),
        ))
    }
}

/// `<content>/projects`.
#[must_use]
pub fn project_content_dir(content_dir: &Path) -> PathBuf {
    content_dir.join(PROJECTS_DIR)
}

/// Create `<content>/projects` so authors have a place for project files.
pub fn ensure_project_content_dir(content_dir: &Path) -> Result<PathBuf> {
    let dir = project_content_dir(content_dir);
    fs::create_dir_all(&dir).map_err(|source| ProjectError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

/// Body used when a project has no content file.
///
/// Values are inserted as written, without escaping.
#[must_use]
pub fn placeholder_html(entry: &ProjectEntry, slug: &str) -> String {
    format!(
        "<h1>{title}</h1>\n\
         <p class=\"project-description\">{description}</p>\n\
         <div class=\"project-placeholder\">\n    \
         <p><em>This project page is automatically generated. To customize it, create a file at \
         <code>content/projects/{slug}.md</code> with your project details.</em></p>\n\
         </div>",
        title = entry.title(),
        description = entry.description(),
    )
}
