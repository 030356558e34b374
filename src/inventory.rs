//! Directory inventory: what a single page directory contains.
//!
//! ```text
//! 02-trip/
//! ├── article.txt        → content   (page content, template "article")
//! ├── photo.jpg          → files
//! ├── photo.jpg.txt      → meta      (sidecar for photo.jpg, key "photo.jpg")
//! ├── photo.thumb.jpg    → thumbs    (key "photo.jpg")
//! ├── cover.thumb.png    → files     (no cover.png: an orphaned thumb is a file)
//! └── 01-day-one/        → children
//! ```
//!
//! ## Classification
//!
//! Each entry of the (non-recursive) listing lands in exactly one bucket:
//!
//! 1. Directories become `children`.
//! 2. Files with the content extension become `content`.
//! 3. `<name>.thumb.(jpg|jpeg|png|gif)` become `thumbs`, keyed by `<name>.<ext>`.
//! 4. Everything else is a plain file.
//!
//! Two fix-ups run afterwards. A thumb whose original image isn't among the
//! files is promoted to a plain file. A content file whose stem names an
//! existing file, either in full (`photo.jpg.txt`) or by that file's stem
//! (`photo.txt` next to `photo.jpg`), is that file's meta sidecar and moves
//! from `content` to `meta`.
//!
//! Dotfiles, a fixed set of OS/VCS artifacts and any configured glob
//! patterns are skipped.

use crate::config::ContentSettings;
use crate::error::{Error, Result};
use crate::naming::natural_cmp;
use indexmap::IndexMap;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Entries never listed, whatever the configuration says.
const IGNORED: &[&str] = &[".", "..", ".DS_Store", ".git", ".svn", "Thumbs.db", "@eaDir"];

static THUMB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+)\.thumb\.(jpg|jpeg|png|gif)$").expect("thumb pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Subdirectory names, naturally sorted.
    pub children: Vec<String>,
    /// Page content files, in listing order.
    pub content: Vec<String>,
    /// Sidecar content files keyed by the stem they describe.
    pub meta: IndexMap<String, String>,
    /// Thumbnails keyed by the filename of their original.
    pub thumbs: IndexMap<String, String>,
    pub files: Vec<String>,
}

impl Inventory {
    /// List and classify `root`. A directory that doesn't exist has an empty
    /// inventory; any other listing failure is an error.
    pub fn scan(root: &Path, settings: &ContentSettings) -> Result<Self> {
        let names = match list(root) {
            Ok(names) => names,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(Error::io(root, err)),
        };

        let ignore: Vec<glob::Pattern> = settings
            .ignore
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();

        let mut inventory = Self::default();
        for (name, is_dir) in names {
            if name.starts_with('.')
                || IGNORED.contains(&name.as_str())
                || ignore.iter().any(|p| p.matches(&name))
            {
                continue;
            }
            if is_dir {
                inventory.children.push(name);
            } else if extension(&name) == Some(settings.extension.as_str()) {
                inventory.content.push(name);
            } else if let Some(caps) = THUMB.captures(&name) {
                let original = format!("{}.{}", &caps[1], &caps[2]);
                inventory.thumbs.insert(original, name);
            } else {
                inventory.files.push(name);
            }
        }

        inventory.promote_orphaned_thumbs();
        inventory.extract_meta();
        inventory.children.sort_by(|a, b| natural_cmp(a, b));

        tracing::debug!(
            root = %root.display(),
            children = inventory.children.len(),
            content = inventory.content.len(),
            files = inventory.files.len(),
            "inventory scanned"
        );
        Ok(inventory)
    }

    fn promote_orphaned_thumbs(&mut self) {
        let files = &self.files;
        let orphaned: Vec<String> = self
            .thumbs
            .keys()
            .filter(|original| !files.contains(*original))
            .cloned()
            .collect();
        for original in orphaned {
            if let Some(thumb) = self.thumbs.shift_remove(&original) {
                self.files.push(thumb);
            }
        }
    }

    fn extract_meta(&mut self) {
        let files = &self.files;
        let mut meta = IndexMap::new();
        self.content.retain(|name| {
            let base = stem(name);
            let describes_file = files.iter().any(|file| file == base || stem(file) == base);
            if describes_file {
                meta.insert(base.to_string(), name.clone());
            }
            !describes_file
        });
        self.meta = meta;
    }

    /// The sidecar for `filename`: `photo.jpg.txt` first, then `photo.txt`.
    pub fn meta_for(&self, filename: &str) -> Option<&str> {
        self.meta
            .get(filename)
            .or_else(|| self.meta.get(stem(filename)))
            .map(String::as_str)
    }

    pub fn thumb_for(&self, filename: &str) -> Option<&str> {
        self.thumbs.get(filename).map(String::as_str)
    }
}

/// Sorted `(name, is_dir)` pairs for a directory.
fn list(root: &Path) -> std::io::Result<Vec<(String, bool)>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry.path().is_dir();
        names.push((name, is_dir));
    }
    names.sort();
    Ok(names)
}

fn extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|e| e.to_str())
}

fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}
