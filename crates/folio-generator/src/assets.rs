//! Static asset copying.
//!
//! The static directory is mirrored verbatim under `<output>/static`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal error.
    #[error("failed to walk static directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Files copied by one asset pass, relative to the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetManifest {
    files: Vec<PathBuf>,
}

impl AssetManifest {
    /// Copied files in traversal order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Number of copied files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing was copied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Copies a directory tree without transforming any file.
///
/// Hidden files are copied as well, empty directories are recreated and
/// symlinks are followed.
#[derive(Debug, Default)]
pub struct AssetProcessor;

impl AssetProcessor {
    /// Create a new asset processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Copy everything under `source_dir` into `dest_dir`.
    ///
    /// A missing source directory copies nothing and does not create
    /// `dest_dir`.
    pub fn process(&self, source_dir: &Path, dest_dir: &Path) -> Result<AssetManifest> {
        let mut manifest = AssetManifest::default();

        if !source_dir.is_dir() {
            debug!(source = %source_dir.display(), "static directory does not exist, skipping");
            return Ok(manifest);
        }

        info!(
            source = %source_dir.display(),
            dest = %dest_dir.display(),
            "copying static assets"
        );

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|_| AssetError::InvalidPath(entry.path().to_path_buf()))?;
            let dest_path = dest_dir.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest_path).map_err(|source| AssetError::Io {
                    path: dest_path.clone(),
                    source,
                })?;
            } else {
                fs::copy(entry.path(), &dest_path).map_err(|source| AssetError::Io {
                    path: entry.path().to_path_buf(),
                    source,
                })?;
                debug!(path = %relative.display(), "copied asset");
                manifest.files.push(relative.to_path_buf());
            }
        }

        info!(count = manifest.len(), "static assets copied");
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_copies_tree_verbatim() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("static");

        fs::create_dir_all(src.path().join("css/vendor")).unwrap();
        fs::create_dir_all(src.path().join("empty")).unwrap();
        fs::write(src.path().join("css/site.css"), "body{}").unwrap();
        fs::write(src.path().join("css/vendor/reset.css"), "*{}").unwrap();
        fs::write(src.path().join(".well-known"), "hidden").unwrap();
        fs::write(src.path().join("logo.png"), [0u8, 159, 146, 150]).unwrap();

        let manifest = AssetProcessor::new().process(src.path(), &dest).unwrap();

        assert_eq!(manifest.len(), 4);
        assert_eq!(fs::read_to_string(dest.join("css/site.css")).unwrap(), "body{}");
        assert_eq!(fs::read_to_string(dest.join("css/vendor/reset.css")).unwrap(), "*{}");
        assert_eq!(fs::read_to_string(dest.join(".well-known")).unwrap(), "hidden");
        assert_eq!(fs::read(dest.join("logo.png")).unwrap(), vec![0u8, 159, 146, 150]);
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let out = TempDir::new().unwrap();
        let dest = out.path().join("static");

        let manifest = AssetProcessor::new()
            .process(&out.path().join("missing"), &dest)
            .unwrap();

        assert!(manifest.is_empty());
        assert!(!dest.exists());
    }
}
