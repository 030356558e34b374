//! Files that belong to a page.
//!
//! A [`File`] is a [`Media`] plus what the page knows about it: the url it
//! is served under, its meta sidecar and its thumbnail. [`Files`] is the
//! keyed-by-filename collection a page hands out.

use crate::collection::Collection;
use crate::content::{Content, ContentBearing};
use crate::field::Field;
use crate::media::{Kind, Media};
use crate::page::PageId;
use serde_json::{Map, Value, json};
use std::cell::OnceCell;
use std::ops::Deref;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct File {
    media: Media,
    page: PageId,
    url: String,
    meta: Option<PathBuf>,
    thumb: Option<String>,
    meta_content: OnceCell<Content>,
}

impl File {
    pub fn new(
        root: impl Into<PathBuf>,
        page: PageId,
        url: impl Into<String>,
        meta: Option<PathBuf>,
        thumb: Option<String>,
    ) -> Self {
        Self {
            media: Media::new(root),
            page,
            url: url.into(),
            meta,
            thumb,
            meta_content: OnceCell::new(),
        }
    }

    /// Id of the page this file lives in.
    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn meta_path(&self) -> Option<&Path> {
        self.meta.as_deref()
    }

    /// The sidecar's parsed fields; empty when the file has no sidecar.
    pub fn meta(&self) -> &Content {
        self.meta_content.get_or_init(|| match &self.meta {
            Some(path) => Content::read(path),
            None => Content::default(),
        })
    }

    pub fn thumb(&self) -> Option<&str> {
        self.thumb.as_deref()
    }

    /// Following file among `siblings`.
    pub fn next<'a>(&self, siblings: &'a Files) -> Option<&'a File> {
        let index = siblings.index_of(self.filename())?;
        siblings.nth(index + 1)
    }

    pub fn prev<'a>(&self, siblings: &'a Files) -> Option<&'a File> {
        let index = siblings.index_of(self.filename())?;
        index.checked_sub(1).and_then(|i| siblings.nth(i))
    }

    pub fn to_array(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("filename".into(), json!(self.filename()));
        map.insert("name".into(), json!(self.name()));
        map.insert("extension".into(), json!(self.extension()));
        map.insert("kind".into(), json!(self.kind()));
        map.insert("mime".into(), json!(self.mime()));
        map.insert("url".into(), json!(self.url));
        map.insert("size".into(), json!(self.size()));
        map.insert("nice_size".into(), json!(self.nice_size()));
        map.insert("modified".into(), json!(self.modified_timestamp()));
        if let Some(dims) = self.dimensions() {
            map.insert("dimensions".into(), json!(dims));
        }
        map.insert("meta".into(), json!(self.meta().to_array()));
        map
    }
}

impl Deref for File {
    type Target = Media;

    fn deref(&self) -> &Media {
        &self.media
    }
}

impl ContentBearing for File {
    fn field(&self, key: &str) -> Option<Field> {
        self.meta().get(key).cloned()
    }
}

/// A page's files keyed by filename, in listing order.
pub type Files = Collection<File>;

impl Collection<File> {
    pub fn of_kind(&self, kind: Kind) -> Self {
        self.filter(|f| f.kind() == kind)
    }

    pub fn images(&self) -> Self {
        self.of_kind(Kind::Image)
    }

    pub fn videos(&self) -> Self {
        self.of_kind(Kind::Video)
    }

    pub fn audio(&self) -> Self {
        self.of_kind(Kind::Audio)
    }

    pub fn documents(&self) -> Self {
        self.of_kind(Kind::Document)
    }

    pub fn code(&self) -> Self {
        self.of_kind(Kind::Code)
    }

    pub fn archives(&self) -> Self {
        self.of_kind(Kind::Archive)
    }

    pub fn find(&self, filename: &str) -> Option<&File> {
        self.get(filename)
    }
}
