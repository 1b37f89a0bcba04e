//! Content collection and ordering.
//!
//! Reads the markdown files directly inside the content directory (not its
//! subdirectories) and turns each one into a [`PageRecord`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use folio_core::{PageRecord, content::is_markdown};
use folio_parser::{ContentParser, ParserError};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

/// Content collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// IO error.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parser error.
    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParserError,
    },

    /// Invalid content path.
    #[error("invalid content path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Content collector that reads and parses content files.
#[derive(Debug)]
pub struct ContentCollector {
    parser: ContentParser,
    content_dir: PathBuf,
}

impl ContentCollector {
    /// Create a new content collector.
    #[must_use]
    pub fn new(content_dir: impl Into<PathBuf>, parser: ContentParser) -> Self {
        Self {
            parser,
            content_dir: content_dir.into(),
        }
    }

    /// The content directory.
    #[must_use]
    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Collect all pages, sorted by their `order` metadata.
    ///
    /// A missing content directory yields no pages.
    pub fn collect(&self) -> Result<Vec<PageRecord>> {
        info!(dir = %self.content_dir.display(), "collecting content");

        let files = self.find_content_files()?;
        info!(count = files.len(), "found content files");

        let mut pages = files
            .par_iter()
            .map(|path| self.load_page(path))
            .collect::<Result<Vec<_>>>()?;

        sort_pages(&mut pages);
        Ok(pages)
    }

    /// Markdown files directly inside the content directory, by file name.
    fn find_content_files(&self) -> Result<Vec<PathBuf>> {
        if !self.content_dir.is_dir() {
            debug!(dir = %self.content_dir.display(), "content directory missing");
            return Ok(Vec::new());
        }

        let io_err = |source| CollectorError::Io {
            path: self.content_dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.content_dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && is_markdown(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Read and parse a single content file.
    pub fn load_page(&self, path: &Path) -> Result<PageRecord> {
        debug!(path = %path.display(), "parsing file");

        let content = fs::read_to_string(path).map_err(|source| CollectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let doc = self
            .parser
            .parse(&content, path)
            .map_err(|source| CollectorError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        PageRecord::from_parsed(path, doc.source, doc.parsed, doc.sections)
            .ok_or_else(|| CollectorError::InvalidPath(path.to_path_buf()))
    }
}

/// Stable ascending sort on `order`; equal orders keep their relative position.
pub fn sort_pages(pages: &mut [PageRecord]) {
    pages.sort_by_key(PageRecord::order);
}
