//! Site configuration (`config.yaml`) and build settings (`folio.toml`).

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Name of the site configuration file inside the content directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Site configuration loaded from `<content>/config.yaml`.
///
/// Only `personal_work` has meaning to the generator. Every other key is kept
/// in [`Config::extra`] and handed to templates untouched, so templates see
/// `config.<key>` exactly as it appears in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Portfolio projects that get their own detail page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal_work: Vec<ProjectEntry>,

    /// Any other top-level keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A single `personal_work` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    /// Output and content file stem. Entries without one are skipped.
    #[serde(default, deserialize_with = "slug_string")]
    pub slug: Option<String>,

    /// Project title.
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: Option<String>,

    /// Short description used on the placeholder page.
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: Option<String>,

    /// Custom extra fields, passed through to templates.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectEntry {
    /// The slug, if present and non-empty.
    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|s| !s.is_empty())
    }

    /// The title, or an empty string.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// The description, or an empty string.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

impl Config {
    /// Load `config.yaml` from the content directory.
    ///
    /// A missing file yields an empty configuration.
    pub fn load(content_dir: &Path) -> Result<Self> {
        let path = content_dir.join(CONFIG_FILE);
        if !path.is_file() {
            debug!(path = %path.display(), "no site config, using empty config");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path).map_err(|e| CoreError::io(&path, e))?;
        let config = Self::from_yaml(&text, &path)?;
        debug!(
            path = %path.display(),
            projects = config.personal_work.len(),
            keys = config.extra.len(),
            "loaded site config"
        );
        Ok(config)
    }

    /// Parse a configuration document. `path` is only used for error reporting.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value =
            serde_yaml::from_str(text).map_err(|e| CoreError::config_parse(path, e.to_string()))?;

        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(_) => serde_yaml::from_value(value)
                .map_err(|e| CoreError::config_parse(path, e.to_string())),
            _ => Err(CoreError::config_parse(
                path,
                "expected a mapping at the top level",
            )),
        }
    }

    /// Whether any project entry would produce a page.
    #[must_use]
    pub fn has_projects(&self) -> bool {
        self.personal_work.iter().any(|p| p.slug().is_some())
    }

    /// Look up an arbitrary top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Treat an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept any YAML scalar and keep it as a string.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar(Value::deserialize(deserializer)?)
}

/// Like [`scalar_string`], but `false` and numeric zero mean no slug.
fn slug_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(false) => Ok(None),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        value => scalar(value),
    }
}

fn scalar<E: serde::de::Error>(value: Value) -> std::result::Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s)),
        _ => Err(E::custom("expected a scalar value")),
    }
}

/// Directory layout and rendering options for a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Markdown sources and `config.yaml`.
    pub content_dir: PathBuf,

    /// Template files.
    pub templates_dir: PathBuf,

    /// Generated site. Deleted and recreated on every build.
    pub output_dir: PathBuf,

    /// Static assets copied to `<output>/static`.
    pub static_dir: PathBuf,

    /// Syntax highlighting theme name.
    pub syntax_theme: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            templates_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("dist"),
            static_dir: PathBuf::from("static"),
            syntax_theme: "base16-ocean.dark".to_string(),
        }
    }
}

impl BuildConfig {
    /// Default settings file name.
    pub const FILE_NAME: &'static str = "folio.toml";

    /// Load build settings from an optional TOML file and `FOLIO_*` environment variables.
    ///
    /// An explicitly given path must exist; the default `folio.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Path::new(Self::FILE_NAME)).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("FOLIO").prefix_separator("_"))
            .build()?;

        let build: BuildConfig = settings.try_deserialize()?;
        build.validate()?;
        Ok(build)
    }

    /// Reject layouts where cleaning the output would destroy sources.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CoreError::config("output_dir cannot be empty"));
        }

        for (name, dir) in [
            ("content_dir", &self.content_dir),
            ("templates_dir", &self.templates_dir),
            ("static_dir", &self.static_dir),
        ] {
            if dir == &self.output_dir {
                return Err(CoreError::config(format!(
                    "output_dir must differ from {name} ({})",
                    dir.display()
                )));
            }
        }

        Ok(())
    }
}
