//! Build orchestration.
//!
//! Coordinates the full site build process.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use folio_core::{BuildConfig, Config, CoreError, PageRecord};
use folio_parser::{ContentParser, ParserError};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    assets::{AssetError, AssetProcessor},
    collector::{CollectorError, ContentCollector},
    projects::{self, ProjectError, ProjectPageGenerator},
    template::{self, TemplateEngine, TemplateError},
};

/// Directory under the output root that receives static assets.
pub const STATIC_OUTPUT_DIR: &str = "static";

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] CoreError),

    /// Parser setup error.
    #[error("parser error: {0}")]
    Parser(#[from] ParserError),

    /// Collector error.
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Project page error.
    #[error("project page error: {0}")]
    Project(#[from] ProjectError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}

impl BuildError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether a required template was missing.
    #[must_use]
    pub fn is_template_not_found(&self) -> bool {
        matches!(
            self,
            Self::Template(TemplateError::NotFound(_))
                | Self::Project(ProjectError::Template(TemplateError::NotFound(_)))
        )
    }
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of content pages generated.
    pub pages: usize,

    /// Number of project pages generated.
    pub projects: usize,

    /// Number of static files copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of a successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Written HTML files: content pages in `order`, then project pages in
    /// configuration order.
    pub files: Vec<PathBuf>,

    /// Build statistics.
    pub stats: BuildStats,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    build: BuildConfig,
}

impl Builder {
    /// Create a new builder.
    #[must_use]
    pub fn new(build: BuildConfig) -> Self {
        Self { build }
    }

    /// Create a builder for explicit directories with default options.
    #[must_use]
    pub fn with_dirs(
        content_dir: impl Into<PathBuf>,
        templates_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::new(BuildConfig {
            content_dir: content_dir.into(),
            templates_dir: templates_dir.into(),
            output_dir: output_dir.into(),
            static_dir: static_dir.into(),
            ..BuildConfig::default()
        })
    }

    /// Build settings.
    #[must_use]
    pub fn settings(&self) -> &BuildConfig {
        &self.build
    }

    /// Build the site and return the written HTML files.
    pub fn generate(&self) -> Result<Vec<PathBuf>> {
        Ok(self.build()?.files)
    }

    /// Execute the full build process.
    ///
    /// The output directory is rebuilt from scratch, so running this twice on
    /// unchanged inputs yields the same tree.
    pub fn build(&self) -> Result<BuildOutput> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            content = %self.build.content_dir.display(),
            templates = %self.build.templates_dir.display(),
            output = %self.build.output_dir.display(),
            "starting build"
        );

        self.build.validate()?;

        // 1. Clean output directory
        self.clean_output()?;

        // 2. Copy static assets
        stats.assets = self.copy_static()?;

        // 3. Load site configuration
        let config = Config::load(&self.build.content_dir)?;

        // 4. Collect content
        let parser = ContentParser::with_theme(&self.build.syntax_theme)?;
        let collector = ContentCollector::new(&self.build.content_dir, parser);
        let pages = collector.collect()?;

        // 5. Render pages
        let templates = TemplateEngine::load(&self.build.templates_dir)?;
        let mut files = self.render_pages(&templates, &config, &pages)?;
        stats.pages = files.len();

        // 6. Project pages
        if config.has_projects() {
            self.prepare_project_content_dir()?;
        }
        let project_files =
            ProjectPageGenerator::new(&collector, &templates, &self.build.output_dir)
                .generate(&config, &pages)?;
        stats.projects = project_files.len();
        files.extend(project_files);

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = stats.pages,
            projects = stats.projects,
            assets = stats.assets,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(BuildOutput { files, stats })
    }

    /// Remove and recreate the output directory.
    fn clean_output(&self) -> Result<()> {
        let dir = &self.build.output_dir;
        if dir.is_dir() {
            debug!(dir = %dir.display(), "cleaning output directory");
            fs::remove_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
        } else if dir.exists() {
            fs::remove_file(dir).map_err(|e| BuildError::io(dir, e))?;
        }
        fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
        Ok(())
    }

    /// Copy the static directory to `<output>/static`.
    fn copy_static(&self) -> Result<usize> {
        let dest = self.build.output_dir.join(STATIC_OUTPUT_DIR);
        let manifest = AssetProcessor::new().process(&self.build.static_dir, &dest)?;
        Ok(manifest.len())
    }

    /// Render every page, in parallel, keeping page order in the result.
    fn render_pages(
        &self,
        templates: &TemplateEngine,
        config: &Config,
        pages: &[PageRecord],
    ) -> Result<Vec<PathBuf>> {
        info!(count = pages.len(), "rendering pages");

        let site = template::site_context(config, pages)?;

        pages
            .par_iter()
            .map(|page| -> Result<PathBuf> {
                let html = templates.render_page(page, &site)?;
                let path = self.build.output_dir.join(page.output_name());
                fs::write(&path, html).map_err(|e| BuildError::io(&path, e))?;

                debug!(path = %path.display(), template = page.template(), "wrote page");
                Ok(path)
            })
            .collect()
    }

    /// Make sure authors have a `<content>/projects` directory to fill.
    fn prepare_project_content_dir(&self) -> Result<()> {
        let dir = projects::ensure_project_content_dir(&self.build.content_dir)?;
        debug!(dir = %dir.display(), "project content directory ready");
        Ok(())
    }
}
