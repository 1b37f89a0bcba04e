//! Folio Generator Library
//!
//! Static site generation engine for Folio.
//!
//! # Modules
//!
//! - [`collector`] - Content collection and ordering
//! - [`template`] - Tera template loading and page rendering
//! - [`projects`] - Project detail pages from `personal_work`
//! - [`assets`] - Static asset copying
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod collector;
pub mod projects;
pub mod template;

use std::path::PathBuf;

pub use assets::{AssetManifest, AssetProcessor};
pub use build::{BuildError, BuildOutput, BuildStats, Builder};
pub use collector::ContentCollector;
use folio_core::BuildConfig;
pub use projects::ProjectPageGenerator;
pub use template::TemplateEngine;

/// Build a site with the given settings and return the written HTML files.
pub fn generate(settings: &BuildConfig) -> build::Result<Vec<PathBuf>> {
    Builder::new(settings.clone()).generate()
}
