//! Frontmatter parsing for content files.
//!
//! Three conventions are recognized, checked in this order:
//!
//! - YAML delimited by `---` lines
//! - TOML delimited by `+++` lines
//! - bare `key: value` header lines at the top of the file, ended by a blank
//!   line (an optional leading `---` and a closing `---`/`...` are allowed)
//!
//! A `---` block that is not a YAML mapping is read as header lines, so values
//! such as `title: Project: part 2` still work. Malformed TOML is an error.
//!
//! Whatever the source, metadata is flattened to a string map: keys are
//! lower-cased, sequences keep their first element (or become `""` when
//! empty), other scalars are stringified.

use std::{collections::BTreeMap, path::Path};

use serde::Serialize;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Page metadata taken from frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// Page title.
    pub title: Option<String>,

    /// Template to render the page with.
    pub template: Option<String>,

    /// Raw sort order, parsed on demand by [`PageMeta::order`].
    pub order: Option<String>,

    /// Any other keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl PageMeta {
    /// Order used when `order` is missing or not an integer.
    pub const DEFAULT_ORDER: i64 = 999;

    /// Template used when `template` is missing.
    pub const DEFAULT_TEMPLATE: &'static str = "page.html";

    /// Metadata carrying only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Set a key, routing the well-known ones to their fields.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "title" => self.title = Some(value),
            "template" => self.template = Some(value),
            "order" => self.order = Some(value),
            _ => {
                self.extra.insert(key, value);
            }
        }
    }

    /// Look up any key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "title" => self.title.as_deref(),
            "template" => self.template.as_deref(),
            "order" => self.order.as_deref(),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    /// Sort order. Unparsable values fall back to the default.
    #[must_use]
    pub fn order(&self) -> i64 {
        self.order
            .as_deref()
            .and_then(|o| o.trim().parse().ok())
            .unwrap_or(Self::DEFAULT_ORDER)
    }

    /// Template name, defaulting to `page.html`.
    #[must_use]
    pub fn template(&self) -> &str {
        self.template.as_deref().unwrap_or(Self::DEFAULT_TEMPLATE)
    }

    /// Whether no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.template.is_none()
            && self.order.is_none()
            && self.extra.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PageMeta {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = Self::default();
        for (key, value) in iter {
            let key: String = key.into();
            meta.insert(key.to_lowercase(), value);
        }
        meta
    }
}

/// Delimiter types for frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML frontmatter delimited by `---`.
    Yaml,
    /// TOML frontmatter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split a delimited frontmatter block from the body.
///
/// Both delimiters must sit on their own line and the opening one must be the
/// first line of the file.
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let first_end = content.find('\n')?;

    let format = match content[..first_end].trim_end() {
        "---" => FrontmatterFormat::Yaml,
        "+++" => FrontmatterFormat::Toml,
        _ => return None,
    };

    let rest = &content[first_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == format.delimiter() {
            return Some((format, &rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// Split bare `key: value` header lines from the body.
///
/// Returns the pairs in file order and the remaining body. When no pair is
/// found the body is the whole input.
pub fn split_header_lines(content: &str) -> (Vec<(String, String)>, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut offset = 0;

    for (index, line) in content.split_inclusive('\n').enumerate() {
        let text = line.trim_end_matches(['\n', '\r']);

        if index == 0 && text.trim_end() == "---" {
            offset += line.len();
            continue;
        }

        if text.trim().is_empty() || matches!(text.trim_end(), "---" | "...") {
            offset += line.len();
            break;
        }

        if let Some((key, value)) = header_pair(text) {
            pairs.push((key.to_lowercase(), value.to_string()));
        } else if text.starts_with("    ") && !pairs.is_empty() {
            // continuation of a multi-line value; only the first line is kept
        } else {
            break;
        }
        offset += line.len();
    }

    if pairs.is_empty() {
        return (pairs, content);
    }
    (pairs, &content[offset..])
}

/// Match `key: value` where the key is `[A-Za-z0-9_-]+` indented at most three spaces.
fn header_pair(line: &str) -> Option<(&str, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }

    let (key, value) = line[indent..].split_once(':')?;
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    valid_key.then(|| (key, value.trim()))
}

/// Parse frontmatter from a string.
///
/// Returns the flattened metadata and the body with the frontmatter removed.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(PageMeta, String)> {
    if let Some((format, fm_str, body)) = split_frontmatter(content) {
        let pairs = match format {
            FrontmatterFormat::Yaml => yaml_pairs(fm_str, path),
            FrontmatterFormat::Toml => Some(toml_pairs(fm_str, path)?),
        };
        if let Some(pairs) = pairs {
            return Ok((pairs.into_iter().collect(), body.to_string()));
        }
    }

    let (pairs, body) = split_header_lines(content);
    Ok((pairs.into_iter().collect(), body.to_string()))
}

/// `None` when the block is not a YAML mapping.
fn yaml_pairs(fm_str: &str, path: &Path) -> Option<Vec<(String, String)>> {
    use serde_yaml::Value;

    if fm_str.trim().is_empty() {
        return Some(Vec::new());
    }

    match serde_yaml::from_str::<Value>(fm_str) {
        Ok(Value::Null) => Some(Vec::new()),
        Ok(Value::Mapping(map)) => Some(
            map.iter()
                .map(|(k, v)| (flatten_yaml(k), flatten_yaml(v)))
                .collect(),
        ),
        Ok(_) => {
            debug!(path = %path.display(), "frontmatter is not a mapping, using header lines");
            None
        }
        Err(e) => {
            let path = path.display();
            debug!(%path, error = %e, "frontmatter is not YAML, using header lines");
            None
        }
    }
}

fn flatten_yaml(value: &serde_yaml::Value) -> String {
    use serde_yaml::Value;

    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => items.first().map(flatten_yaml).unwrap_or_default(),
        Value::Mapping(_) => serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
        Value::Tagged(tagged) => flatten_yaml(&tagged.value),
    }
}

fn toml_pairs(fm_str: &str, path: &Path) -> Result<Vec<(String, String)>> {
    let table: toml::Table =
        toml::from_str(fm_str).map_err(|e| CoreError::frontmatter(path, e.to_string()))?;

    Ok(table
        .iter()
        .map(|(k, v)| (k.clone(), flatten_toml(v)))
        .collect())
}

fn flatten_toml(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items.first().map(flatten_toml).unwrap_or_default(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_yaml_frontmatter() {
        let content = r#"---
title: "Hello World"
order: 2
---

This is the body content."#;

        let (format, fm, body) = split_frontmatter(content).expect("split");
        assert_eq!(format, FrontmatterFormat::Yaml);
        assert!(fm.contains("title:"));
        assert!(body.trim_start().starts_with("This is the body"));
    }

    #[test]
    fn test_split_toml_frontmatter() {
        let content = r#"+++
title = "Hello World"
+++

This is the body content."#;

        let (format, fm, body) = split_frontmatter(content).expect("split");
        assert_eq!(format, FrontmatterFormat::Toml);
        assert!(fm.contains("title ="));
        assert!(body.trim_start().starts_with("This is the body"));
    }

    #[test]
    fn test_closing_delimiter_must_be_own_line() {
        let content = "---\ntitle: a---b\n";
        assert!(split_frontmatter(content).is_none());
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just a heading\n\nSome content.";
        let (meta, body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");

        assert!(meta.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: "Test Post"
template: home.html
order: 0
tags:
  - rust
  - test
---

Content here."#;

        let (meta, body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");

        assert_eq!(meta.title.as_deref(), Some("Test Post"));
        assert_eq!(meta.template(), "home.html");
        assert_eq!(meta.order(), 0);
        assert_eq!(meta.get("tags"), Some("rust"));
        assert_eq!(body.trim(), "Content here.");
    }

    #[test]
    fn test_parse_toml_frontmatter() {
        let content = "+++\ntitle = \"Test Post\"\norder = 3\ntags = []\n+++\n\nContent here.";

        let (meta, body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");

        assert_eq!(meta.title.as_deref(), Some("Test Post"));
        assert_eq!(meta.order(), 3);
        assert_eq!(meta.get("tags"), Some(""));
        assert_eq!(body.trim(), "Content here.");
    }

    #[test]
    fn test_parse_header_lines() {
        let content = "Title: About Me\nOrder: 2\nSummary: first line\n    second line\n\n# About\n";

        let (meta, body) = parse_frontmatter(content, Path::new("about.md")).expect("parse");

        assert_eq!(meta.title.as_deref(), Some("About Me"));
        assert_eq!(meta.order(), 2);
        assert_eq!(meta.get("summary"), Some("first line"));
        assert_eq!(body, "# About\n");
    }

    #[test]
    fn test_header_lines_stop_at_non_matching_line() {
        let (pairs, body) = split_header_lines("title: Hi\nnot a pair here\n");

        assert_eq!(pairs, vec![("title".to_string(), "Hi".to_string())]);
        assert_eq!(body, "not a pair here\n");
    }

    #[test]
    fn test_header_lines_with_unclosed_dashes() {
        let (pairs, body) = split_header_lines("---\ntitle: Hi\n\nBody\n");

        assert_eq!(pairs.len(), 1);
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_non_yaml_dashes_read_as_header_lines() {
        let content = "---\ntitle: Project: part 2\nlabel: [WIP] Thing\nsummary: *note*\n---\nBody\n";

        let (meta, body) = parse_frontmatter(content, Path::new("notes.md")).expect("parse");

        assert_eq!(meta.title.as_deref(), Some("Project: part 2"));
        assert_eq!(meta.get("label"), Some("[WIP] Thing"));
        assert_eq!(meta.get("summary"), Some("*note*"));
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_bracketed_title_read_as_header_line() {
        let content = "---\nTitle: [WIP] Thing\n---\n# Draft\n";

        let (meta, body) = parse_frontmatter(content, Path::new("draft.md")).expect("parse");

        assert_eq!(meta.title.as_deref(), Some("[WIP] Thing"));
        assert_eq!(body, "# Draft\n");
    }

    #[test]
    fn test_malformed_toml_frontmatter() {
        let content = "+++\ntitle = [unclosed\n+++\nBody";
        let err = parse_frontmatter(content, Path::new("bad.md")).unwrap_err();

        assert!(err.to_string().contains("bad.md"));
    }

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let value = serde_yaml::to_value(PageMeta::titled("Home")).unwrap();

        assert_eq!(value["title"], serde_yaml::Value::from("Home"));
        assert!(value["template"].is_null());
        assert!(value["order"].is_null());
        assert!(value.get("order").is_some());
    }

    #[test]
    fn test_keys_are_lowercased() {
        let (meta, _) = parse_frontmatter("---\nTitle: X\nAuthor: Y\n---\n", Path::new("a.md"))
            .expect("parse");

        assert_eq!(meta.title.as_deref(), Some("X"));
        assert_eq!(meta.get("author"), Some("Y"));
    }

    #[test]
    fn test_order_defaults() {
        let mut meta = PageMeta::default();
        assert_eq!(meta.order(), PageMeta::DEFAULT_ORDER);

        meta.insert("order", "first");
        assert_eq!(meta.order(), PageMeta::DEFAULT_ORDER);

        meta.insert("order", " -4 ");
        assert_eq!(meta.order(), -4);
    }

    #[test]
    fn test_template_default() {
        assert_eq!(PageMeta::default().template(), "page.html");
    }
}
