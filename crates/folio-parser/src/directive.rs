//! Bracketed block directives embedded in markdown.
//!
//! A directive looks like `[name]...[/name]`. Its inner text is rendered on
//! its own and removed from the surrounding document, so a template can place
//! it somewhere other than the main body.

use std::collections::BTreeMap;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Directive errors.
#[derive(Debug, Error)]
pub enum DirectiveError {
    /// The markers could not be compiled into a pattern.
    #[error("invalid directive {name}: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for directive operations.
pub type Result<T> = std::result::Result<T, DirectiveError>;

/// A single named block directive.
#[derive(Debug, Clone)]
pub struct Directive {
    name: String,
    pattern: Regex,
}

impl Directive {
    /// A directive using `[name]` and `[/name]` as markers.
    pub fn bracketed(name: &str) -> Result<Self> {
        Self::new(name, &format!("[{name}]"), &format!("[/{name}]"))
    }

    /// A directive with explicit opening and closing markers.
    ///
    /// Markers are matched literally and case-sensitively. The inner text is
    /// matched lazily, so blocks do not nest and never overlap.
    pub fn new(name: &str, open: &str, close: &str) -> Result<Self> {
        let pattern = format!("(?s){}(.*?){}", regex::escape(open), regex::escape(close));
        let pattern = Regex::new(&pattern).map_err(|source| DirectiveError::Pattern {
            name: name.to_string(),
            source,
        })?;

        Ok(Self {
            name: name.to_string(),
            pattern,
        })
    }

    /// Directive name, used as the key of the extracted section.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered set of directives applied before markdown conversion.
#[derive(Debug, Clone)]
pub struct DirectiveSet {
    directives: Vec<Directive>,
}

/// Name of the portfolio introduction directive.
pub const PERSONAL_WORK_INTRO: &str = "personal_work_intro";

impl DirectiveSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self {
            directives: Vec::new(),
        }
    }

    /// The built-in directives.
    pub fn builtin() -> Result<Self> {
        let mut set = Self::empty();
        set.register(Directive::bracketed(PERSONAL_WORK_INTRO)?);
        Ok(set)
    }

    /// Append a directive. Directives run in registration order.
    pub fn register(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    /// Names of the registered directives.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directives.iter().map(Directive::name)
    }

    /// Remove every directive block from `text`.
    ///
    /// Each block's trimmed inner text is passed to `render`; the result is
    /// stored under the directive name. When a directive occurs more than
    /// once, the last occurrence wins but all of them are removed.
    pub fn extract<F>(&self, text: &str, render: F) -> (String, BTreeMap<String, String>)
    where
        F: Fn(&str) -> String,
    {
        let mut sections = BTreeMap::new();
        let mut output = text.to_string();

        for directive in &self.directives {
            let mut count = 0usize;
            let stripped = directive
                .pattern
                .replace_all(&output, |caps: &regex::Captures<'_>| {
                    let inner = caps.get(1).map_or("", |m| m.as_str()).trim();
                    sections.insert(directive.name.clone(), render(inner));
                    count += 1;
                    ""
                })
                .into_owned();

            if count > 0 {
                debug!(directive = %directive.name, count, "extracted directive blocks");
            }
            output = stripped;
        }

        (output, sections)
    }
}
