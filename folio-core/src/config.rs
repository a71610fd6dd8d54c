//! Configuration parsing and management.
//!
//! Two layers: the site-wide `folio.yml` ([`Config`]) and one YAML file per
//! page ([`PageConfig`]). Page configs are resolved into a closed set of
//! variants once, when they are loaded.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::slug::slugify;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Duplicate page slug '{slug}' ({path:?})")]
    DuplicatePage { slug: String, path: PathBuf },

    #[error("Page slug '{slug}' is reserved for a generated file ({path:?})")]
    ReservedSlug { slug: String, path: PathBuf },
}

/// Slugs whose output collides with files the build generates.
const RESERVED_SLUGS: &[&str] = &["index", "404"];

/// Main configuration struct matching the folio.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Slug of the page also written as index.html
    #[serde(default)]
    pub home: Option<String>,

    /// Regexes matched against page config paths (relative to the pages dir)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    String::from("/")
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub author: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_content_dir")]
    pub content: PathBuf,

    #[serde(default = "default_pages_dir")]
    pub pages: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output: PathBuf,

    #[serde(default)]
    pub theme: Option<PathBuf>,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_pages_dir() -> PathBuf {
    PathBuf::from("pages")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content_dir(),
            pages: default_pages_dir(),
            output: default_output_dir(),
            theme: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;

        if config.site.title.trim().is_empty() {
            return Err(ConfigError::MissingField("site.title".to_string()));
        }

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from YAML text. Relative paths resolve against
    /// the current directory.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Content directory (markdown, bib and card sources)
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Directory holding one config file per page
    pub fn pages_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.pages)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Get the theme directory (None means use built-in)
    pub fn theme_dir(&self) -> Option<PathBuf> {
        self.paths.theme.as_ref().map(|p| self.resolve_path(p))
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }

    /// Normalized base URL with leading and trailing slash ("/foo/" or "/")
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }

    /// Load every page config under the pages directory, sorted for navigation.
    pub fn load_pages(&self) -> Result<Vec<PageDefinition>, ConfigError> {
        let pages_dir = self.pages_dir();
        let ignores = compile_ignore_patterns(&self.ignore_patterns);
        let mut pages: Vec<PageDefinition> = Vec::new();

        for entry in WalkDir::new(&pages_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);
            if !is_yaml {
                continue;
            }

            let rel = path
                .strip_prefix(&pages_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            if ignores.iter().any(|re| re.is_match(&rel)) {
                tracing::debug!("Ignoring page config {} due to ignore_patterns", rel);
                continue;
            }

            let page = PageDefinition::from_file(path)?;
            if RESERVED_SLUGS.contains(&page.slug.as_str()) {
                return Err(ConfigError::ReservedSlug {
                    slug: page.slug,
                    path: path.to_path_buf(),
                });
            }
            if pages.iter().any(|p| p.slug == page.slug) {
                return Err(ConfigError::DuplicatePage {
                    slug: page.slug,
                    path: path.to_path_buf(),
                });
            }
            pages.push(page);
        }

        pages.sort_by(|a, b| {
            a.config
                .order()
                .unwrap_or(i32::MAX)
                .cmp(&b.config.order().unwrap_or(i32::MAX))
                .then_with(|| a.slug.cmp(&b.slug))
        });

        tracing::debug!("Loaded {} page configs from {:?}", pages.len(), pages_dir);
        Ok(pages)
    }
}

/// Ensure base URLs have a leading and trailing slash
pub fn normalize_base_url(raw: &str) -> String {
    if raw.is_empty() {
        return "/".to_string();
    }

    let mut s = raw.trim().to_string();
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    if !s.ends_with('/') {
        s.push('/');
    }

    // Collapse duplicate slashes (but keep leading)
    while s.contains("//") {
        s = s.replace("//", "/");
        if !s.starts_with('/') {
            s.insert(0, '/');
        }
    }

    if s.is_empty() {
        "/".to_string()
    } else {
        s
    }
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

/// Per-page configuration, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageConfig {
    Publication(PublicationPageConfig),
    Text(TextPageConfig),
    Card(CardPageConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationPageConfig {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// BibTeX file, relative to the content directory
    pub source: String,

    #[serde(default)]
    pub order: Option<i32>,

    /// Render the search box and year/type menus
    #[serde(default = "default_true")]
    pub filters: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPageConfig {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Markdown file, relative to the content directory
    pub source: String,

    #[serde(default)]
    pub order: Option<i32>,

    /// Render a table of contents from the headings
    #[serde(default)]
    pub toc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPageConfig {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Card list (YAML), relative to the content directory
    pub source: String,

    #[serde(default)]
    pub order: Option<i32>,
}

impl PageConfig {
    /// Parse a page config from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn title(&self) -> &str {
        match self {
            PageConfig::Publication(c) => &c.title,
            PageConfig::Text(c) => &c.title,
            PageConfig::Card(c) => &c.title,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            PageConfig::Publication(c) => c.description.as_deref(),
            PageConfig::Text(c) => c.description.as_deref(),
            PageConfig::Card(c) => c.description.as_deref(),
        }
    }

    pub fn source(&self) -> &str {
        match self {
            PageConfig::Publication(c) => &c.source,
            PageConfig::Text(c) => &c.source,
            PageConfig::Card(c) => &c.source,
        }
    }

    pub fn order(&self) -> Option<i32> {
        match self {
            PageConfig::Publication(c) => c.order,
            PageConfig::Text(c) => c.order,
            PageConfig::Card(c) => c.order,
        }
    }
}

/// A page config together with the slug derived from its file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDefinition {
    pub slug: String,
    pub config: PageConfig,
    pub config_path: PathBuf,
}

impl PageDefinition {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = PageConfig::from_yaml(&text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(slugify)
            .unwrap_or_default();
        if slug.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "page slug (from file name {:?})",
                path
            )));
        }

        Ok(Self {
            slug,
            config,
            config_path: path.to_path_buf(),
        })
    }
}
