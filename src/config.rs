//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user config file only needs the keys it overrides.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! url = ""                  # Base URL prepended to every page url
//!
//! [content]
//! extension = "txt"         # Extension of content files
//! ignore = []               # Extra glob patterns skipped during inventory
//!
//! [pages]
//! home = "home"             # uid of the home page
//! error = "error"           # uid of the error page
//!
//! [templates]
//! root = "templates"        # Template directory
//! extension = "html"        # Extension of template files
//! negotiate = false         # Pick representations from the Accept header
//!
//! [search]
//! minlength = 2             # Query tokens shorter than this are dropped
//! stopwords = []            # Tokens removed from every query
//! words = false             # Match whole words only
//!
//! [cache]
//! enabled = false           # Keep a render cache on disk
//! root = ".cache"           # Render cache directory
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// Passed by value into [`crate::Site::new`] and read from there; there is no
/// process-wide configuration registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Base URL; page urls are `url + "/" + uri`.
    pub url: String,
    pub content: ContentSettings,
    pub pages: PagesConfig,
    pub templates: TemplatesConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.extension.is_empty() || self.content.extension.contains('.') {
            return Err(ConfigError::Validation(
                "content.extension must be a bare extension like \"txt\"".into(),
            ));
        }
        for pattern in &self.content.ignore {
            if let Err(err) = glob::Pattern::new(pattern) {
                return Err(ConfigError::Validation(format!(
                    "content.ignore pattern {pattern:?} is invalid: {err}"
                )));
            }
        }
        if self.pages.home.is_empty() || self.pages.error.is_empty() {
            return Err(ConfigError::Validation(
                "pages.home and pages.error must not be empty".into(),
            ));
        }
        if self.search.minlength == 0 {
            return Err(ConfigError::Validation(
                "search.minlength must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// How page directories are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentSettings {
    /// Extension of content files, without the dot.
    pub extension: String,
    /// Glob patterns for entries skipped on top of the built-in ignore list.
    pub ignore: Vec<String>,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            extension: "txt".to_string(),
            ignore: Vec::new(),
        }
    }
}

/// Well-known pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    pub home: String,
    pub error: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            home: "home".to_string(),
            error: "error".to_string(),
        }
    }
}

/// Template lookup and representation negotiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    pub root: String,
    pub extension: String,
    /// When true, a page without an explicitly requested representation picks
    /// one from the request's Accept header.
    pub negotiate: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            root: "templates".to_string(),
            extension: "html".to_string(),
            negotiate: false,
        }
    }
}

/// Defaults for full-text search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub minlength: usize,
    pub stopwords: Vec<String>,
    pub words: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            minlength: 2,
            stopwords: Vec::new(),
            words: false,
        }
    }
}

/// Render cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub root: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            root: ".cache".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`, falling back to stock defaults when it
/// doesn't exist.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Flatfile Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Base URL prepended to every page url (no trailing slash).
url = ""

# ---------------------------------------------------------------------------
# Content directories
# ---------------------------------------------------------------------------
[content]
# Extension of the delimited content files. The file name (without the
# extension) picks the page's template.
extension = "txt"

# Extra entries to skip when listing a page directory, as glob patterns.
# Dotfiles, .git, .svn, .DS_Store, Thumbs.db and @eaDir are always skipped.
ignore = []

# ---------------------------------------------------------------------------
# Well-known pages
# ---------------------------------------------------------------------------
[pages]
home = "home"
error = "error"

# ---------------------------------------------------------------------------
# Templates
# ---------------------------------------------------------------------------
[templates]
# Directory holding `<name>.<extension>` templates and
# `<name>.<representation>.<extension>` alternate representations.
root = "templates"
extension = "html"

# Pick a representation from the Accept header when none is requested.
negotiate = false

# ---------------------------------------------------------------------------
# Search
# ---------------------------------------------------------------------------
[search]
# Query words shorter than this are ignored.
minlength = 2

# Words removed from every query.
stopwords = []

# Only count whole-word matches.
words = false

# ---------------------------------------------------------------------------
# Render cache
# ---------------------------------------------------------------------------
[cache]
# Flushed whenever a page is changed.
enabled = false
root = ".cache"
"##
}
