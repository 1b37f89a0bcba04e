//! Folio Parser Library
//!
//! Markdown conversion with directive extraction.

pub mod directive;
pub mod markdown;
pub mod syntax;

use std::{collections::BTreeMap, path::Path};

pub use directive::{Directive, DirectiveSet};
use folio_core::ParsedContent;
pub use markdown::MarkdownParser;
pub use syntax::SyntaxHighlighter;
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Markdown parsing error.
    #[error("markdown error: {0}")]
    Markdown(#[from] markdown::MarkdownError),

    /// Directive setup error.
    #[error("directive error: {0}")]
    Directive(#[from] directive::DirectiveError),
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// A content file after directive extraction and markdown conversion.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source text with directive blocks removed.
    pub source: String,

    /// Converted body and metadata.
    pub parsed: ParsedContent,

    /// Rendered directive sections keyed by directive name.
    pub sections: BTreeMap<String, String>,
}

/// Runs directives, then markdown, over one file at a time.
#[derive(Debug)]
pub struct ContentParser {
    markdown: MarkdownParser,
    directives: DirectiveSet,
}

impl ContentParser {
    /// Create a parser with the built-in directives.
    pub fn new() -> Result<Self> {
        Self::with_parts(MarkdownParser::new(), DirectiveSet::builtin()?)
    }

    /// Create a parser with the built-in directives and a syntax theme.
    pub fn with_theme(theme: &str) -> Result<Self> {
        Self::with_parts(MarkdownParser::with_theme(theme), DirectiveSet::builtin()?)
    }

    /// Create a parser from explicit parts.
    pub fn with_parts(markdown: MarkdownParser, directives: DirectiveSet) -> Result<Self> {
        Ok(Self {
            markdown,
            directives,
        })
    }

    /// Parse one file's text.
    ///
    /// Directive blocks are rendered in a fresh conversion each and stripped
    /// before the remaining text goes through the markdown parser.
    pub fn parse(&self, content: &str, path: &Path) -> Result<Document> {
        let (source, sections) = self
            .directives
            .extract(content, |inner| self.markdown.render_fragment(inner));
        let parsed = self.markdown.parse(&source, path)?;

        Ok(Document {
            source,
            parsed,
            sections,
        })
    }

    /// Get the markdown parser.
    pub fn markdown(&self) -> &MarkdownParser {
        &self.markdown
    }

    /// Get the directive set.
    pub fn directives(&self) -> &DirectiveSet {
        &self.directives
    }
}
