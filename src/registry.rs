//! Template registry.
//!
//! Pages don't render themselves; they only ask the registry which templates
//! exist. A template may have alternative representations (`article.json`,
//! `article.rss`), each with the MIME type it produces.
//!
//! ```text
//! templates/
//! ├── default.html         → template "default"
//! ├── article.html         → template "article"
//! ├── article.json.html    → representation "json" of "article" (application/json)
//! └── feed.rss.html        → representation "rss" of "feed" (application/rss+xml)
//! ```

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    pub suffix: String,
    pub mime: String,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub path: Option<PathBuf>,
    /// False for entries that only exist because a representation was
    /// registered for them.
    pub main: bool,
    /// Keyed by suffix, in registration order.
    pub representations: IndexMap<String, Representation>,
}

impl Template {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            main: false,
            representations: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    templates: IndexMap<String, Template>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every `name.ext` and `name.suffix.ext` file in `dir`.
    /// A missing directory gives an empty registry.
    pub fn scan(dir: &Path, extension: &str) -> Result<Self> {
        let mut registry = Self::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %dir.display(), "no template directory");
                return Ok(registry);
            }
            Err(err) => return Err(Error::io(dir, err)),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let suffix = format!(".{extension}");
        for path in paths {
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(base) = filename.strip_suffix(&suffix) else {
                continue;
            };
            match base.split_once('.') {
                Some((name, repr)) => {
                    let mime = mime_for(repr);
                    registry.register_representation(name, repr, mime, Some(path.clone()));
                }
                None => registry.register(base, Some(path.clone())),
            }
        }

        tracing::debug!(dir = %dir.display(), templates = registry.templates.len(), "templates registered");
        Ok(registry)
    }

    pub fn register(&mut self, name: &str, path: Option<PathBuf>) {
        let template = self
            .templates
            .entry(name.to_string())
            .or_insert_with(|| Template::new(name));
        template.path = path;
        template.main = true;
    }

    /// Add a representation, creating the template entry if needed.
    pub fn register_representation(
        &mut self,
        name: &str,
        suffix: &str,
        mime: impl Into<String>,
        path: Option<PathBuf>,
    ) {
        let template = self
            .templates
            .entry(name.to_string())
            .or_insert_with(|| Template::new(name));
        template.representations.insert(
            suffix.to_string(),
            Representation {
                suffix: suffix.to_string(),
                mime: mime.into(),
                path,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// True when `name` has a main template file (not only representations).
    pub fn has(&self, name: &str) -> bool {
        self.templates.get(name).is_some_and(|t| t.main)
    }

    pub fn representation(&self, name: &str, suffix: &str) -> Option<&Representation> {
        self.templates.get(name)?.representations.get(suffix)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

/// MIME type for a representation suffix, `application/octet-stream` when
/// the suffix isn't a known extension.
pub fn mime_for(suffix: &str) -> String {
    mime_guess::from_ext(suffix)
        .first_or_octet_stream()
        .to_string()
}
