//! Build command - generates the static site

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use color_eyre::eyre::{Result, WrapErr};
use folio_core::BuildConfig;
use folio_generator::{BuildOutput, Builder};

/// Directory overrides given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOverrides {
    pub content: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
}

impl BuildOverrides {
    /// Apply every given override on top of loaded settings.
    pub fn apply(&self, settings: &mut BuildConfig) {
        if let Some(dir) = &self.content {
            settings.content_dir = dir.clone();
        }
        if let Some(dir) = &self.templates {
            settings.templates_dir = dir.clone();
        }
        if let Some(dir) = &self.output {
            settings.output_dir = dir.clone();
        }
        if let Some(dir) = &self.static_dir {
            settings.static_dir = dir.clone();
        }
    }
}

/// Run the build command.
///
/// Loads `folio.toml` (or `config_path`) and `FOLIO_*` environment variables,
/// applies the command-line overrides and builds the site.
pub fn run(config_path: Option<&Path>, overrides: &BuildOverrides) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?overrides, "Starting build");

    let mut settings =
        BuildConfig::load(config_path).wrap_err("Failed to load build settings")?;
    overrides.apply(&mut settings);
    settings
        .validate()
        .wrap_err("Invalid build settings")?;

    tracing::debug!(?settings, "Loaded build settings");

    let output = Builder::new(settings.clone())
        .build()
        .wrap_err("Build failed")?;

    let duration = start.elapsed();
    print_summary(&output, &settings);

    tracing::info!(stats = ?output.stats, ?duration, "Build completed successfully");

    Ok(())
}

fn print_summary(output: &BuildOutput, settings: &BuildConfig) {
    println!("Successfully built {} pages!", output.files.len());
    for file in &output.files {
        println!("  {}", file.display());
    }
    println!();
    println!("  Pages:      {}", output.stats.pages);
    println!("  Projects:   {}", output.stats.projects);
    println!("  Assets:     {}", output.stats.assets);
    println!("  Output:     {}", settings.output_dir.display());
}
