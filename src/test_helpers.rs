//! Shared test utilities.
//!
//! Provides a temp-dir content tree builder, lookup helpers that panic with
//! a clear message, and a tree shape assertion.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tree = ContentTree::new()
//!     .page("1-blog/blog", &[("title", "Blog")])
//!     .page("1-blog/1-first/article", &[("title", "First")]);
//! let site = tree.site();
//!
//! let first = find(&site, "blog/first");
//! assert_eq!(first.title(), "First");
//!
//! assert_tree_shape(&site, &[("blog", &["blog/first"])]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::format;
use crate::page::Page;
use crate::pages::Pages;
use crate::site::Site;

// =========================================================================
// Fixture setup
// =========================================================================

/// A content directory inside a temp dir, built up call by call.
///
/// The content root is `<tmp>/content`; everything is removed when the
/// tree is dropped.
pub struct ContentTree {
    _tmp: TempDir,
    root: PathBuf,
}

impl ContentTree {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("content");
        fs::create_dir_all(&root).unwrap();
        Self { _tmp: tmp, root }
    }

    /// Write a content file. `path` is the file path without extension:
    /// `"2-blog/1-first/article"` writes `2-blog/1-first/article.txt`.
    pub fn page(self, path: &str, fields: &[(&str, &str)]) -> Self {
        let file = self.root.join(format!("{path}.txt"));
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(&file, format::encode(fields.iter().copied())).unwrap();
        self
    }

    /// Create an empty page directory.
    pub fn dir(self, path: &str) -> Self {
        fs::create_dir_all(self.root.join(path)).unwrap();
        self
    }

    /// Write an arbitrary file.
    pub fn file(self, path: &str, contents: &str) -> Self {
        let file = self.root.join(path);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(file, contents).unwrap();
        self
    }

    /// The content root.
    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn site(&self) -> Site {
        self.site_with(SiteConfig::default())
    }

    pub fn site_with(&self, config: SiteConfig) -> Site {
        Site::new(&self.root, config)
    }
}

// =========================================================================
// Lookups — panic with a clear message on miss
// =========================================================================

/// Find a page by uri. Panics if not found.
pub fn find<'s>(site: &'s Site, uri: &str) -> Page<'s> {
    site.find(uri).found().unwrap_or_else(|| {
        let available = uris(&site.index().unwrap());
        panic!("page '{uri}' not found. Available: {available:?}")
    })
}

/// All ids in collection order.
pub fn uris(pages: &Pages<'_>) -> Vec<String> {
    pages.keys().map(str::to_string).collect()
}

/// Assert the top two levels of the tree.
///
/// Each entry is `(id, child ids)`. Use `&[]` for leaves.
pub fn assert_tree_shape(site: &Site, expected: &[(&str, &[&str])]) {
    let top = site.children().unwrap();
    let expected_top: Vec<&str> = expected.iter().map(|(id, _)| *id).collect();
    assert_eq!(uris(&top), expected_top, "top-level pages mismatch");

    for (id, children) in expected {
        let actual = uris(&find(site, id).children().unwrap());
        assert_eq!(actual, children.to_vec(), "children of '{id}' mismatch");
    }
}
