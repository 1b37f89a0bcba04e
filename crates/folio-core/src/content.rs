//! Content types and structures.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::frontmatter::PageMeta;

/// Extension of content files.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Slug that maps to the site root.
pub const INDEX_SLUG: &str = "index";

/// Whether a path names a markdown content file.
#[must_use]
pub fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == MARKDOWN_EXTENSION)
}

/// Parsed content with metadata and rendered HTML.
#[derive(Debug, Clone, Default)]
pub struct ParsedContent {
    /// Flattened frontmatter metadata.
    pub meta: PageMeta,

    /// Rendered HTML content.
    pub html: String,

    /// Table of contents extracted from headings.
    pub toc: Vec<TocEntry>,
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,

    /// Heading text.
    pub text: String,

    /// Anchor ID for linking.
    pub id: String,
}

/// A content file ready for rendering.
///
/// Serialized as the `page` template binding; every entry of `sections` shows
/// up as a top-level field (e.g. `page.personal_work_intro`).
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    /// Rendered HTML body.
    pub content: String,

    /// Frontmatter metadata.
    pub meta: PageMeta,

    /// Source text after directive extraction.
    pub raw: String,

    /// File stem, unique per build.
    pub slug: String,

    /// File name including extension.
    pub filename: String,

    /// Table of contents.
    pub toc: Vec<TocEntry>,

    /// Rendered directive sections keyed by directive name.
    #[serde(flatten)]
    pub sections: BTreeMap<String, String>,
}

impl PageRecord {
    /// Build a record for the file at `path`.
    ///
    /// Returns `None` when the file name is not valid UTF-8.
    pub fn from_parsed(
        path: &Path,
        raw: String,
        parsed: ParsedContent,
        sections: BTreeMap<String, String>,
    ) -> Option<Self> {
        let slug = path.file_stem()?.to_str()?.to_string();
        let filename = path.file_name()?.to_str()?.to_string();

        Some(Self {
            content: parsed.html,
            meta: parsed.meta,
            raw,
            slug,
            filename,
            toc: parsed.toc,
            sections,
        })
    }

    /// Sort key.
    #[must_use]
    pub fn order(&self) -> i64 {
        self.meta.order()
    }

    /// Name of the template this page renders with.
    #[must_use]
    pub fn template(&self) -> &str {
        self.meta.template()
    }

    /// Output file name relative to the output root.
    #[must_use]
    pub fn output_name(&self) -> String {
        if self.slug == INDEX_SLUG {
            "index.html".to_string()
        } else {
            format!("{}.html", self.slug)
        }
    }

    /// Rendered `[personal_work_intro]` section, if the page had one.
    #[must_use]
    pub fn personal_work_intro(&self) -> Option<&str> {
        self.section("personal_work_intro")
    }

    /// Rendered directive section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }
}

/// The `page` binding of a project detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPage {
    /// HTML body.
    pub content: String,

    /// Only `title` is set.
    pub meta: PageMeta,
}

impl ProjectPage {
    /// Create a project page.
    #[must_use]
    pub fn new(content: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            meta: PageMeta::titled(title),
        }
    }

    /// Page title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.meta.title.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slug_path: &str) -> PageRecord {
        PageRecord::from_parsed(
            Path::new(slug_path),
            String::new(),
            ParsedContent::default(),
            BTreeMap::new(),
        )
        .expect("record")
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("content/about.md")));
        assert!(!is_markdown(Path::new("content/config.yaml")));
        assert!(!is_markdown(Path::new("content/README")));
    }

    #[test]
    fn test_slug_and_filename() {
        let page = record("content/about-me.md");
        assert_eq!(page.slug, "about-me");
        assert_eq!(page.filename, "about-me.md");
        assert_eq!(page.output_name(), "about-me.html");
    }

    #[test]
    fn test_index_maps_to_root() {
        assert_eq!(record("content/index.md").output_name(), "index.html");
    }

    #[test]
    fn test_sections_are_flattened() {
        let mut sections = BTreeMap::new();
        sections.insert(
            "personal_work_intro".to_string(),
            "<p>intro</p>".to_string(),
        );
        let page = PageRecord::from_parsed(
            Path::new("index.md"),
            "raw".to_string(),
            ParsedContent::default(),
            sections,
        )
        .expect("record");

        assert_eq!(page.personal_work_intro(), Some("<p>intro</p>"));

        let value = serde_yaml::to_value(&page).expect("serialize");
        assert_eq!(
            value.get("personal_work_intro").and_then(|v| v.as_str()),
            Some("<p>intro</p>")
        );
        assert!(value.get("sections").is_none());
    }

    #[test]
    fn test_project_page_meta() {
        let page = ProjectPage::new("<p>x</p>", "Compiler");
        assert_eq!(page.title(), "Compiler");

        let value = serde_yaml::to_value(&page).expect("serialize");
        let meta = value.get("meta").expect("meta");
        assert_eq!(meta.get("title").and_then(|v| v.as_str()), Some("Compiler"));
        assert!(meta.get("template").is_some_and(|v| v.is_null()));
    }
}
