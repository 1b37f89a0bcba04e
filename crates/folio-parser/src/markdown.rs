//! Markdown parser using pulldown-cmark.

use std::{collections::HashSet, path::Path};

use folio_core::{
    content::{ParsedContent, TocEntry},
    frontmatter::parse_frontmatter,
};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use thiserror::Error;

use crate::syntax::SyntaxHighlighter;

/// Markdown parsing errors.
#[derive(Debug, Error)]
pub enum MarkdownError {
    /// Failed to parse frontmatter.
    #[error("frontmatter error: {0}")]
    Frontmatter(#[from] folio_core::error::CoreError),
}

/// Result type for markdown operations.
pub type Result<T> = std::result::Result<T, MarkdownError>;

/// Markdown parser with syntax highlighting and heading anchors.
///
/// Holds only immutable options and syntax data, so one parser can convert
/// any number of documents (also from several threads) without one document
/// affecting the next.
#[derive(Debug)]
pub struct MarkdownParser {
    highlighter: SyntaxHighlighter,
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownParser {
    /// Create a new markdown parser with default options.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            highlighter: SyntaxHighlighter::default(),
            options,
        }
    }

    /// Create a parser with a custom syntax theme.
    pub fn with_theme(theme: &str) -> Self {
        let mut parser = Self::new();
        parser.highlighter.set_theme(theme);
        parser
    }

    /// Parse markdown content with frontmatter.
    pub fn parse(&self, content: &str, path: &Path) -> Result<ParsedContent> {
        let (meta, body) = parse_frontmatter(content, path)?;
        let (html, toc) = self.render_markdown(&body);

        Ok(ParsedContent { meta, html, toc })
    }

    /// Parse markdown without frontmatter (body only).
    pub fn parse_body(&self, body: &str) -> (String, Vec<TocEntry>) {
        self.render_markdown(body)
    }

    /// Render a standalone fragment to HTML.
    ///
    /// Leading frontmatter is dropped; if it does not parse, the fragment is
    /// rendered as written.
    pub fn render_fragment(&self, content: &str) -> String {
        let body = match parse_frontmatter(content, Path::new("<fragment>")) {
            Ok((_, body)) => body,
            Err(_) => content.to_string(),
        };
        self.render_markdown(&body).0
    }

    /// Render markdown to HTML with TOC extraction.
    ///
    /// Headings and code blocks are rewritten on the event stream; everything
    /// else goes through pulldown-cmark's own HTML writer.
    fn render_markdown(&self, content: &str) -> (String, Vec<TocEntry>) {
        let mut events = Parser::new_ext(content, self.options);
        let mut out: Vec<Event> = Vec::new();
        let mut toc = Vec::new();
        let mut used_ids = HashSet::new();

        while let Some(event) = events.next() {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let mut inner = Vec::new();
                    let mut text = String::new();
                    for event in events.by_ref() {
                        match &event {
                            Event::End(TagEnd::Heading(_)) => break,
                            Event::Text(t) | Event::Code(t) => text.push_str(t),
                            _ => {}
                        }
                        inner.push(event);
                    }

                    let anchor = match id {
                        Some(id) => id.to_string(),
                        None => unique_id(slugify(&text), &used_ids),
                    };
                    used_ids.insert(anchor.clone());
                    toc.push(TocEntry {
                        level: level as u8,
                        text,
                        id: anchor.clone(),
                    });

                    out.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(CowStr::from(anchor)),
                        classes,
                        attrs,
                    }));
                    out.extend(inner);
                    out.push(Event::End(TagEnd::Heading(level)));
                }

                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };

                    let mut code = String::new();
                    for event in events.by_ref() {
                        match event {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(t) => code.push_str(&t),
                            _ => {}
                        }
                    }

                    let highlighted = self.highlighter.highlight(&code, lang.as_deref());
                    out.push(Event::Html(CowStr::from(highlighted)));
                }

                other => out.push(other),
            }
        }

        let mut html_out = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut html_out, out.into_iter());
        (html_out, toc)
    }
}

/// Convert text to a URL-safe slug.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Make `id` unique among `used` by appending `_1`, `_2`, ...
fn unique_id(id: String, used: &HashSet<String>) -> String {
    let base = if id.is_empty() {
        "section".to_string()
    } else {
        id
    };

    if !used.contains(&base) {
        return base;
    }

    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_markdown() {
        let parser = MarkdownParser::new();
        let content = r#"---
title: "Test Post"
---

# Hello World

This is a test."#;

        let result = parser.parse(content, Path::new("test.md")).unwrap();

        assert_eq!(result.meta.title.as_deref(), Some("Test Post"));
        assert!(result.html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(result.html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_strong_paragraph() {
        let parser = MarkdownParser::new();
        let (html, _) = parser.parse_body("**bold**");

        assert_eq!(html.trim_end(), "<p><strong>bold</strong></p>");
    }

    #[test]
    fn test_render_fragment_drops_frontmatter() {
        let parser = MarkdownParser::new();

        assert_eq!(
            parser.render_fragment("title: Ignored\n\n*hi*").trim_end(),
            "<p><em>hi</em></p>"
        );
        assert!(parser.render_fragment("---\nbad: [\n---\ntext").contains("text"));
    }

    #[test]
    fn test_parse_code_block() {
        let parser = MarkdownParser::new();
        let (html, _) = parser.parse_body(
            r#"```rust
fn main() {
    println!("Hello");
}
```"#,
        );

        assert!(html.contains("<pre"));
        assert!(html.contains("main"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_indented_code_block_is_plain() {
        let parser = MarkdownParser::new();
        let (html, _) = parser.parse_body("Intro\n\n    let x = 1;\n");

        assert!(html.contains("<pre><code>let x = 1;\n</code></pre>"));
    }

    #[test]
    fn test_toc_extraction() {
        let parser = MarkdownParser::new();
        let (_, toc) = parser.parse_body(
            r#"# Heading 1
## Heading 2
### Heading `3`"#,
        );

        assert_eq!(toc.len(), 3);
        assert_eq!(toc[0].level, 1);
        assert_eq!(toc[0].text, "Heading 1");
        assert_eq!(toc[1].level, 2);
        assert_eq!(toc[2].text, "Heading 3");
        assert_eq!(toc[2].id, "heading-3");
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let parser = MarkdownParser::new();
        let (html, toc) = parser.parse_body("## Notes\n\n## Notes\n\n## Notes\n");

        let ids: Vec<_> = toc.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["notes", "notes_1", "notes_2"]);
        assert!(html.contains("id=\"notes_2\""));
    }

    #[test]
    fn test_explicit_heading_id() {
        let parser = MarkdownParser::new();
        let (html, toc) = parser.parse_body("# Work {#my-work}\n");

        assert_eq!(toc[0].id, "my-work");
        assert!(html.contains("id=\"my-work\""));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test 123 Post"), "test-123-post");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("Special!@#Chars"), "specialchars");
    }

    #[test]
    fn test_table_rendering() {
        let parser = MarkdownParser::new();
        let (html, _) = parser.parse_body(
            r#"| Header 1 | Header 2 |
|----------|----------|
| Cell 1   | Cell 2   |"#,
        );

        assert!(html.contains("<table>"));
        assert!(html.contains("<thead>"));
        assert!(html.contains("<td>"));
    }

    #[test]
    fn test_task_list() {
        let parser = MarkdownParser::new();
        let (html, _) = parser.parse_body(
            r#"- [x] Done
- [ ] Not done"#,
        );

        assert!(html.contains("checkbox"));
        assert!(html.contains("checked"));
    }

    #[test]
    fn test_no_frontmatter() {
        let parser = MarkdownParser::new();
        let content = "# Just Content\n\nNo frontmatter here.";
        let result = parser.parse(content, Path::new("test.md")).unwrap();

        assert!(result.meta.is_empty());
        assert!(result.html.contains("Just Content"));
    }

    #[test]
    fn test_parses_are_independent() {
        let parser = MarkdownParser::new();
        let first = parser
            .parse("---\ntitle: First\n---\n# Intro\n", Path::new("a.md"))
            .unwrap();
        let second = parser.parse("# Intro\n", Path::new("b.md")).unwrap();

        assert_eq!(first.meta.title.as_deref(), Some("First"));
        assert!(second.meta.is_empty());
        assert_eq!(second.toc[0].id, "intro");
    }
}
