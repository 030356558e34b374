//! Writes to the content tree.
//!
//! Every operation here changes the filesystem first and the in-memory tree
//! second, then resets the caches of the touched pages and flushes the
//! render cache. A failing OS call aborts the operation before any in-memory
//! state changes.

use super::{Page, join_id};
use crate::error::{Error, Result};
use crate::format;
use crate::naming::{self, slugify, split_num_prefix};
use indexmap::IndexMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

type Compute = Box<dyn Fn(Option<&str>) -> String>;

enum Change {
    Set(String),
    Remove,
    Compute(Compute),
}

/// Field changes applied by [`Page::update`], in the order they were added.
///
/// ```ignore
/// page.update(Update::new().set("title", "New").remove("draft"))?;
/// ```
#[derive(Default)]
pub struct Update {
    changes: Vec<(String, Change)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.changes
            .push((format::normalize_key(key.as_ref()), Change::Set(value.into())));
        self
    }

    pub fn remove(mut self, key: impl AsRef<str>) -> Self {
        self.changes
            .push((format::normalize_key(key.as_ref()), Change::Remove));
        self
    }

    /// Derive the new value from the current one (`None` when unset).
    pub fn compute(
        mut self,
        key: impl AsRef<str>,
        f: impl Fn(Option<&str>) -> String + 'static,
    ) -> Self {
        self.changes
            .push((format::normalize_key(key.as_ref()), Change::Compute(Box::new(f))));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn apply(self, data: &mut IndexMap<String, String>) {
        for (key, change) in self.changes {
            match change {
                Change::Set(value) => {
                    data.insert(key, value);
                }
                Change::Remove => {
                    data.shift_remove(&key);
                }
                Change::Compute(f) => {
                    let value = f(data.get(&key).map(String::as_str));
                    data.insert(key, value);
                }
            }
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Update {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Update::new(), |update, (k, v)| update.set(k, v))
    }
}

impl<'s> Page<'s> {
    /// Create a child page from `name` (`"uid"` or `"3-uid"`), writing a
    /// `<template>.<ext>` content file holding `data`.
    pub fn create_child<K, V>(
        &self,
        name: &str,
        template: &str,
        data: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Page<'s>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (num, raw_uid) = split_num_prefix(name.trim_matches('/'));
        let uid = slugify(raw_uid);
        if uid.is_empty() {
            return Err(Error::MissingUid);
        }

        self.reset();
        if self.children()?.values().any(|c| c.uid() == uid) {
            return Err(Error::DuplicateUid(uid));
        }

        let root = self.root().join(naming::dirname(num, &uid));
        fs::create_dir(&root).map_err(|e| Error::io(&root, e))?;

        let template = if template.is_empty() { "default" } else { template };
        let file = root.join(format!("{template}.{}", self.site.options().content.extension));
        fs::write(&file, format::encode(data)).map_err(|e| Error::io(&file, e))?;

        tracing::info!(parent = %self.id(), uid = %uid, template, "page created");
        self.reset();
        touch(&self.root());
        self.site.flush_cache();

        let id = join_id(&self.id(), &uid);
        self.children()?.find(&uid).into_result(&id)
    }

    /// Apply `update` to the content fields and rewrite the content file.
    pub fn update(&self, update: Update) -> Result<()> {
        let mut data = self.content()?.to_array();
        update.apply(&mut data);

        let file = self.content_file()?;
        fs::write(&file, format::encode(&data)).map_err(|e| Error::io(&file, e))?;

        tracing::info!(page = %self.id(), file = %file.display(), "page updated");
        self.reset();
        touch(&self.root());
        self.site.flush_cache();
        Ok(())
    }

    /// Add `by` to a numeric field; a missing or non-numeric value counts as 0.
    pub fn increment(&self, field: &str, by: i64) -> Result<()> {
        self.update(Update::new().compute(field, move |old| {
            (parse_number(old) + by).to_string()
        }))
    }

    /// Subtract `by`, never going below `min`.
    pub fn decrement(&self, field: &str, by: i64, min: Option<i64>) -> Result<()> {
        self.update(Update::new().compute(field, move |old| {
            let value = parse_number(old) - by;
            min.map_or(value, |min| value.max(min)).to_string()
        }))
    }

    /// Change the uid, keeping the number prefix.
    pub fn move_to(&self, uid: &str) -> Result<()> {
        self.guard_site_root("the site root cannot be renamed")?;
        let uid = slugify(uid);
        if uid.is_empty() {
            return Err(Error::MissingUid);
        }
        if uid == self.uid() {
            return Ok(());
        }
        if self.siblings(false)?.values().any(|p| p.uid() == uid) {
            return Err(Error::DuplicateUid(uid));
        }
        let num = self.num();
        self.relocate(num, uid)
    }

    /// Make the page visible at position `num`.
    pub fn sort(&self, num: u32) -> Result<()> {
        self.guard_site_root("the site root cannot be sorted")?;
        if self.num() == Some(num) {
            return Ok(());
        }
        self.relocate(Some(num), self.uid())
    }

    /// Drop the number prefix.
    pub fn hide(&self) -> Result<()> {
        self.guard_site_root("the site root cannot be hidden")?;
        if self.is_invisible() {
            return Ok(());
        }
        self.relocate(None, self.uid())
    }

    /// Remove the page directory. Pages with children are only removed when
    /// `force` is set; the site root, home and error pages never are.
    pub fn delete(&self, force: bool) -> Result<()> {
        self.guard_site_root("it is the site root")?;
        if self.is_home_page() {
            return Err(self.protected("it is the home page"));
        }
        if self.is_error_page() {
            return Err(self.protected("it is the error page"));
        }
        if !force && self.has_children()? {
            return Err(Error::HasChildren(self.id()));
        }

        let root = self.root();
        fs::remove_dir_all(&root).map_err(|e| Error::io(&root, e))?;

        tracing::info!(page = %self.id(), force, "page deleted");
        self.site.forget(self.id);
        if let Some(parent) = self.parent() {
            parent.reset();
            touch(&parent.root());
        }
        self.site.flush_cache();
        Ok(())
    }

    /// Rename the directory to match `num`/`uid` and update the tree.
    fn relocate(&self, num: Option<u32>, uid: String) -> Result<()> {
        let dirname = naming::dirname(num, &uid);
        let old = self.root();
        let new = old
            .parent()
            .map(|p| p.join(&dirname))
            .ok_or_else(|| self.protected("it has no parent directory"))?;
        if new.exists() {
            return Err(Error::DuplicateUid(dirname));
        }
        fs::rename(&old, &new).map_err(|e| Error::io(&old, e))?;

        tracing::info!(from = %old.display(), to = %new.display(), "page renamed");
        self.site.relocate(self.id, num, uid, dirname);
        self.reset();
        touch(&new);
        self.site.flush_cache();
        Ok(())
    }

    fn guard_site_root(&self, reason: &'static str) -> Result<()> {
        if self.is_site() {
            Err(self.protected(reason))
        } else {
            Ok(())
        }
    }

    fn protected(&self, reason: &'static str) -> Error {
        Error::Protected {
            id: self.id(),
            reason,
        }
    }
}

fn parse_number(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Bump a directory's mtime so `Site::modified` notices the change.
fn touch(dir: &Path) {
    let result = fs::File::open(dir).and_then(|f| f.set_modified(SystemTime::now()));
    if let Err(err) = result {
        tracing::debug!(dir = %dir.display(), error = %err, "could not touch directory");
    }
}
