//! Parsed content files.
//!
//! A page's content file (and a file's meta sidecar) is read once and kept as
//! a [`Content`]: the raw text, the field keys in file order, and a map from
//! normalized key to [`Field`]. A missing or unreadable file is not an error;
//! it produces an empty `Content` so templates can treat every page the same.

use crate::field::Field;
use crate::format;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Anything templates can read named fields from.
///
/// Structural properties (uid, url, ...) have typed accessors on the
/// implementors; this is the fallback for free-form content fields.
pub trait ContentBearing {
    fn field(&self, key: &str) -> Option<Field>;
}

#[derive(Debug, Clone, Default)]
pub struct Content {
    root: PathBuf,
    raw: String,
    keys: Vec<String>,
    fields: HashMap<String, Field>,
}

impl Content {
    /// Read and parse the file at `root`.
    pub fn read(root: &Path) -> Self {
        match std::fs::read_to_string(root) {
            Ok(raw) => {
                tracing::debug!(path = %root.display(), bytes = raw.len(), "content parsed");
                Self::parse(root, &raw)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::empty(root),
            Err(err) => {
                tracing::warn!(path = %root.display(), error = %err, "content file unreadable");
                Self::empty(root)
            }
        }
    }

    pub fn parse(root: &Path, raw: &str) -> Self {
        let mut keys = Vec::new();
        let mut fields = HashMap::new();
        for (key, value) in format::decode(raw) {
            keys.push(key.clone());
            fields.insert(key.clone(), Field::new(key, value));
        }
        Self {
            root: root.to_path_buf(),
            raw: raw.to_string(),
            keys,
            fields,
        }
    }

    pub fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name without extension; a page's intended template.
    pub fn name(&self) -> String {
        self.root
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn exists(&self) -> bool {
        self.root.is_file()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Look up a field; `key` is normalized first, so `Meta-Title`,
    /// `meta title` and `meta_title` all find the same field.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(&format::normalize_key(key))
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Fields in file order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.keys.iter().filter_map(|k| self.fields.get(k))
    }

    /// Field name → raw value, in file order.
    pub fn to_array(&self) -> IndexMap<String, String> {
        self.fields()
            .map(|f| (f.key().to_string(), f.value().to_string()))
            .collect()
    }
}

impl ContentBearing for Content {
    fn field(&self, key: &str) -> Option<Field> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_content() {
        let tmp = TempDir::new().unwrap();
        let content = Content::read(&tmp.path().join("article.txt"));
        assert!(content.is_empty());
        assert!(!content.exists());
        assert_eq!(content.name(), "article");
    }

    #[test]
    fn read_parses_fields_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("article.txt");
        std::fs::write(&path, "Title: Hi\n\n----\n\nText: Body").unwrap();

        let content = Content::read(&path);
        assert_eq!(content.keys(), &["title".to_string(), "text".to_string()]);
        assert_eq!(content.get("Title").unwrap().value(), "Hi");
        assert!(content.raw().starts_with("Title"));
        assert!(content.exists());
    }

    #[test]
    fn lookup_normalizes_keys() {
        let content = Content::parse(Path::new("x.txt"), "Meta-Title: M");
        assert!(content.has("meta title"));
        assert!(content.has("META_TITLE"));
        assert!(!content.has("title"));
    }

    #[test]
    fn to_array_preserves_order() {
        let content = Content::parse(Path::new("x.txt"), "B: 2\n----\nA: 1");
        let keys: Vec<_> = content.to_array().into_keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn clone_is_deep() {
        let content = Content::parse(Path::new("x.txt"), "A: 1");
        let cloned = content.clone();
        drop(content);
        assert_eq!(cloned.get("a").unwrap().value(), "1");
    }
}
