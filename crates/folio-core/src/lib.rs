//! Folio Core Library
//!
//! Core types, configuration, and error handling for the Folio static site generator.

pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;

pub use config::{BuildConfig, Config, ProjectEntry};
pub use content::{PageRecord, ParsedContent, ProjectPage, TocEntry};
pub use error::{CoreError, Result};
pub use frontmatter::PageMeta;
