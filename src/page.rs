//! Pages of the content tree.
//!
//! Every directory under the content root is a page. The [`Site`] owns one
//! [`PageNode`] per page it has looked at, in an arena indexed by [`PageId`];
//! a [`Page`] is a cheap `Copy` handle pairing that id with the site.
//!
//! ## Identity
//!
//! ```text
//! content/                 site root  id ""          depth 0
//! ├── 1-blog/              uid "blog" id "blog"      num 1
//! │   └── 03-first/        uid "first" id "blog/first"
//! └── about/               uid "about" id "about"    invisible
//! ```
//!
//! A page is *visible* when its directory name has a number prefix. Its id
//! (also its uri) is the parent's id joined with its uid.
//!
//! ## Caching
//!
//! Everything derived from disk (inventory, content, children, files, url...)
//! is computed on first use and kept in the node. [`Page::reset`] drops this
//! page's cached state and that of every ancestor, which is how mutations
//! make the rest of the tree see their effect.

mod mutate;

pub use mutate::Update;

use crate::content::{Content, ContentBearing};
use crate::error::Result;
use crate::field::Field;
use crate::file::{File, Files};
use crate::inventory::Inventory;
use crate::negotiation::AcceptHeader;
use crate::pages::Pages;
use crate::registry::Representation;
use crate::site::Site;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Index of a page node in its site's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub(crate) usize);

impl PageId {
    /// The site root is always the first node.
    pub const ROOT: PageId = PageId(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub num: Option<u32>,
    pub uid: String,
    pub dirname: String,
    pub id: String,
    pub root: PathBuf,
}

#[derive(Debug, Default)]
pub(crate) struct PageCache {
    pub inventory: Option<Rc<Inventory>>,
    pub content: Option<Rc<Content>>,
    pub children: Option<Rc<Vec<PageId>>>,
    pub index: Option<Rc<Vec<PageId>>>,
    pub files: Option<Rc<Files>>,
    pub parents: Option<Rc<Vec<PageId>>>,
    pub url: Option<String>,
    pub diruri: Option<String>,
    pub hash: Option<String>,
    pub intended_template: Option<String>,
    pub template: Option<String>,
    pub representations: HashMap<String, Option<Representation>>,
    pub modified: Option<Option<SystemTime>>,
}

/// Transient relevance left on a page by the last search that scanned it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchMark {
    pub hits: usize,
    pub score: u32,
}

#[derive(Debug)]
pub(crate) struct PageNode {
    pub parent: Option<PageId>,
    pub depth: usize,
    pub ident: RefCell<Identity>,
    /// Every child node materialized so far, in materialization order.
    pub kids: RefCell<Vec<PageId>>,
    pub deleted: Cell<bool>,
    pub cache: RefCell<PageCache>,
    pub search: Cell<Option<SearchMark>>,
}

impl PageNode {
    pub fn new(parent: Option<PageId>, depth: usize, ident: Identity) -> Self {
        Self {
            parent,
            depth,
            ident: RefCell::new(ident),
            kids: RefCell::new(Vec::new()),
            deleted: Cell::new(false),
            cache: RefCell::new(PageCache::default()),
            search: Cell::new(None),
        }
    }

    pub fn clear(&self) {
        *self.cache.borrow_mut() = PageCache::default();
    }
}

/// Which pages `next_in`/`prev_in` may land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Invisible,
}

#[derive(Clone, Copy)]
pub struct Page<'s> {
    site: &'s Site,
    id: PageId,
}

impl PartialEq for Page<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.site, other.site)
    }
}

impl Eq for Page<'_> {}

impl fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({:?})", self.id())
    }
}

impl<'s> Page<'s> {
    pub(crate) fn new(site: &'s Site, id: PageId) -> Self {
        Self { site, id }
    }

    pub fn site(&self) -> &'s Site {
        self.site
    }

    pub fn page_id(&self) -> PageId {
        self.id
    }

    pub(crate) fn node(&self) -> Rc<PageNode> {
        self.site.node(self.id)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn uid(&self) -> String {
        self.node().ident.borrow().uid.clone()
    }

    /// Same as the uid.
    pub fn slug(&self) -> String {
        self.uid()
    }

    pub fn num(&self) -> Option<u32> {
        self.node().ident.borrow().num
    }

    pub fn dirname(&self) -> String {
        self.node().ident.borrow().dirname.clone()
    }

    /// Slash-separated uids from the site root; `""` for the root itself.
    pub fn id(&self) -> String {
        self.node().ident.borrow().id.clone()
    }

    pub fn uri(&self) -> String {
        self.id()
    }

    /// Directory on disk.
    pub fn root(&self) -> PathBuf {
        self.node().ident.borrow().root.clone()
    }

    pub fn depth(&self) -> usize {
        self.node().depth
    }

    /// Path of directory names below the content root, e.g. `1-blog/03-first`.
    pub fn diruri(&self) -> String {
        let node = self.node();
        let cached = node.cache.borrow().diruri.clone();
        if let Some(diruri) = cached {
            return diruri;
        }
        let diruri = match self.parent() {
            None => String::new(),
            Some(parent) => join_id(&parent.diruri(), &self.dirname()),
        };
        node.cache.borrow_mut().diruri = Some(diruri.clone());
        diruri
    }

    pub fn url(&self) -> String {
        let node = self.node();
        let cached = node.cache.borrow().url.clone();
        if let Some(url) = cached {
            return url;
        }
        let url = if self.is_site() || self.is_home_page() {
            self.site.url()
        } else {
            format!("{}/{}", self.site.url().trim_end_matches('/'), self.id())
        };
        node.cache.borrow_mut().url = Some(url.clone());
        url
    }

    /// Base url for this page's files.
    pub fn content_url(&self) -> String {
        let base = format!(
            "{}/{}",
            self.site.url().trim_end_matches('/'),
            self.site.content_dirname()
        );
        join_url(&base, &self.diruri())
    }

    /// SHA-256 of the id, hex encoded.
    pub fn hash(&self) -> String {
        let node = self.node();
        let cached = node.cache.borrow().hash.clone();
        if let Some(hash) = cached {
            return hash;
        }
        let hash = format!("{:x}", Sha256::digest(self.id().as_bytes()));
        node.cache.borrow_mut().hash = Some(hash.clone());
        hash
    }

    /// Modification time of the content file, or of the directory when the
    /// page has no content file.
    pub fn modified(&self) -> Option<SystemTime> {
        let node = self.node();
        let cached = node.cache.borrow().modified;
        if let Some(modified) = cached {
            return modified;
        }
        let mtime = |path: &Path| std::fs::metadata(path).and_then(|m| m.modified()).ok();
        let modified = self
            .content_file()
            .ok()
            .and_then(|file| mtime(&file))
            .or_else(|| mtime(&self.root()));
        node.cache.borrow_mut().modified = Some(modified);
        modified
    }

    // =========================================================================
    // Disk-backed members
    // =========================================================================

    pub fn inventory(&self) -> Result<Rc<Inventory>> {
        let node = self.node();
        let cached = node.cache.borrow().inventory.clone();
        if let Some(inventory) = cached {
            return Ok(inventory);
        }
        let inventory = Rc::new(Inventory::scan(&self.root(), &self.site.options().content)?);
        node.cache.borrow_mut().inventory = Some(inventory.clone());
        Ok(inventory)
    }

    /// Path of the content file, whether or not it exists yet.
    pub fn content_file(&self) -> Result<PathBuf> {
        let name = format!(
            "{}.{}",
            self.intended_template()?,
            self.site.options().content.extension
        );
        Ok(self.root().join(name))
    }

    pub fn content(&self) -> Result<Rc<Content>> {
        let node = self.node();
        let cached = node.cache.borrow().content.clone();
        if let Some(content) = cached {
            return Ok(content);
        }
        let content = Rc::new(Content::read(&self.content_file()?));
        node.cache.borrow_mut().content = Some(content.clone());
        Ok(content)
    }

    /// The title field, falling back to the uid.
    pub fn title(&self) -> String {
        self.content()
            .ok()
            .and_then(|c| c.get("title").filter(|f| f.is_not_empty()).map(|f| f.value().to_string()))
            .unwrap_or_else(|| self.uid())
    }

    pub fn children(&self) -> Result<Pages<'s>> {
        let node = self.node();
        let cached = node.cache.borrow().children.clone();
        let ids = match cached {
            Some(ids) => ids,
            None => {
                let inventory = self.inventory()?;
                let ids: Vec<PageId> = inventory
                    .children
                    .iter()
                    .map(|dirname| self.site.materialize(self.id, dirname))
                    .collect();
                let ids = Rc::new(ids);
                node.cache.borrow_mut().children = Some(ids.clone());
                ids
            }
        };
        Ok(Pages::children_of(self.site, self.id, ids))
    }

    pub fn files(&self) -> Result<Rc<Files>> {
        let node = self.node();
        let cached = node.cache.borrow().files.clone();
        if let Some(files) = cached {
            return Ok(files);
        }
        let inventory = self.inventory()?;
        let root = self.root();
        let base = self.content_url();
        let files: Files = inventory
            .files
            .iter()
            .map(|filename| {
                let file = File::new(
                    root.join(filename),
                    self.id,
                    format!("{base}/{filename}"),
                    inventory.meta_for(filename).map(|m| root.join(m)),
                    inventory.thumb_for(filename).map(str::to_string),
                );
                (filename.clone(), file)
            })
            .collect();
        let files = Rc::new(files);
        node.cache.borrow_mut().files = Some(files.clone());
        Ok(files)
    }

    /// Drop the cached state of this page and all its ancestors.
    pub fn reset(&self) {
        let mut current = Some(self.id);
        while let Some(id) = current {
            let node = self.site.node(id);
            node.clear();
            current = node.parent;
        }
    }

    // =========================================================================
    // Templates
    // =========================================================================

    /// Stem of the first content file, `"default"` when there is none.
    pub fn intended_template(&self) -> Result<String> {
        let node = self.node();
        let cached = node.cache.borrow().intended_template.clone();
        if let Some(name) = cached {
            return Ok(name);
        }
        let inventory = self.inventory()?;
        let name = inventory
            .content
            .first()
            .and_then(|file| Path::new(file).file_stem())
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "default".to_string());
        node.cache.borrow_mut().intended_template = Some(name.clone());
        Ok(name)
    }

    /// The intended template when it is registered, `"default"` otherwise.
    pub fn template(&self) -> Result<String> {
        let node = self.node();
        let cached = node.cache.borrow().template.clone();
        if let Some(name) = cached {
            return Ok(name);
        }
        let intended = self.intended_template()?;
        let name = if self.site.registry().has(&intended) {
            intended
        } else {
            "default".to_string()
        };
        node.cache.borrow_mut().template = Some(name.clone());
        Ok(name)
    }

    /// Pick a representation of this page's template.
    ///
    /// An explicitly `requested` suffix wins and is never second-guessed;
    /// without one, and when negotiation is enabled, the registered
    /// representation the `accept` header rates highest is chosen (the first
    /// registered on a tie). `None` means the main template.
    pub fn representation(
        &self,
        requested: Option<&str>,
        accept: Option<&str>,
    ) -> Result<Option<Representation>> {
        let key = format!("{}|{}", requested.unwrap_or(""), accept.unwrap_or(""));
        let node = self.node();
        let cached = node.cache.borrow().representations.get(&key).cloned();
        if let Some(representation) = cached {
            return Ok(representation);
        }

        let template = self.template()?;
        let registry = self.site.registry();
        let chosen = match (requested, accept) {
            (Some(suffix), _) => registry.representation(&template, suffix).cloned(),
            (None, Some(accept)) if self.site.options().templates.negotiate => {
                let header = AcceptHeader::parse(accept);
                let mut best: Option<(&Representation, f32)> = None;
                if let Some(entry) = registry.get(&template) {
                    for representation in entry.representations.values() {
                        let quality = header.quality(&representation.mime);
                        if quality > 0.0 && best.is_none_or(|(_, q)| quality > q) {
                            best = Some((representation, quality));
                        }
                    }
                }
                best.map(|(representation, _)| representation.clone())
            }
            _ => None,
        };

        node.cache
            .borrow_mut()
            .representations
            .insert(key, chosen.clone());
        Ok(chosen)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn parent(&self) -> Option<Page<'s>> {
        self.node().parent.map(|id| Page::new(self.site, id))
    }

    /// Ancestors nearest first, without the site root.
    pub fn parents(&self) -> Pages<'s> {
        let node = self.node();
        let cached = node.cache.borrow().parents.clone();
        let ids = match cached {
            Some(ids) => ids,
            None => {
                let mut ids = Vec::new();
                let mut current = self.parent();
                while let Some(page) = current.filter(|p| !p.is_site()) {
                    ids.push(page.id);
                    current = page.parent();
                }
                let ids = Rc::new(ids);
                node.cache.borrow_mut().parents = Some(ids.clone());
                ids
            }
        };
        Pages::from_ids(self.site, None, &ids)
    }

    /// The parent's children, with or without this page.
    pub fn siblings(&self, include_self: bool) -> Result<Pages<'s>> {
        let Some(parent) = self.parent() else {
            return Ok(Pages::new(self.site));
        };
        let children = parent.children()?;
        Ok(if include_self {
            children
        } else {
            children.not_page(self)
        })
    }

    /// The page after this one in `collection`, optionally skipping pages
    /// of the wrong visibility.
    pub fn next_in(
        &self,
        collection: &Pages<'s>,
        visibility: Option<Visibility>,
    ) -> Option<Page<'s>> {
        let index = collection.index_of(self)?;
        match visibility {
            None => collection.nth(index + 1),
            Some(v) => collection.offset(index + 1).with_visibility(v).first(),
        }
    }

    pub fn prev_in(
        &self,
        collection: &Pages<'s>,
        visibility: Option<Visibility>,
    ) -> Option<Page<'s>> {
        let index = collection.index_of(self)?;
        match visibility {
            None => index.checked_sub(1).and_then(|i| collection.nth(i)),
            Some(v) => collection.limit(index).with_visibility(v).last(),
        }
    }

    pub fn next(&self) -> Result<Option<Page<'s>>> {
        Ok(self.next_in(&self.siblings(true)?, None))
    }

    pub fn prev(&self) -> Result<Option<Page<'s>>> {
        Ok(self.prev_in(&self.siblings(true)?, None))
    }

    pub fn next_visible(&self) -> Result<Option<Page<'s>>> {
        Ok(self.next_in(&self.siblings(true)?, Some(Visibility::Visible)))
    }

    pub fn prev_visible(&self) -> Result<Option<Page<'s>>> {
        Ok(self.prev_in(&self.siblings(true)?, Some(Visibility::Visible)))
    }

    pub fn next_invisible(&self) -> Result<Option<Page<'s>>> {
        Ok(self.next_in(&self.siblings(true)?, Some(Visibility::Invisible)))
    }

    pub fn prev_invisible(&self) -> Result<Option<Page<'s>>> {
        Ok(self.prev_in(&self.siblings(true)?, Some(Visibility::Invisible)))
    }

    pub fn has_next(&self) -> Result<bool> {
        Ok(self.next()?.is_some())
    }

    pub fn has_prev(&self) -> Result<bool> {
        Ok(self.prev()?.is_some())
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    pub fn is(&self, other: &Page<'_>) -> bool {
        self.id == other.id && std::ptr::eq(self.site, other.site)
    }

    pub fn is_site(&self) -> bool {
        self.depth() == 0
    }

    pub fn is_visible(&self) -> bool {
        self.num().is_some()
    }

    pub fn is_invisible(&self) -> bool {
        !self.is_visible()
    }

    pub fn is_home_page(&self) -> bool {
        !self.is_site() && self.id() == self.site.options().pages.home
    }

    pub fn is_error_page(&self) -> bool {
        !self.is_site() && self.id() == self.site.options().pages.error
    }

    pub fn is_child_of(&self, other: &Page<'_>) -> bool {
        !self.is(other) && self.parent().is_some_and(|p| p.is(other))
    }

    pub fn is_parent_of(&self, other: &Page<'_>) -> bool {
        other.is_child_of(self)
    }

    /// True when `other` is one of [`Page::parents`]; the site root never is.
    pub fn is_descendant_of(&self, other: &Page<'_>) -> bool {
        !self.is(other) && self.parents().iter().any(|p| p.is(other))
    }

    pub fn is_ancestor_of(&self, other: &Page<'_>) -> bool {
        other.is_descendant_of(self)
    }

    /// This page is the one being visited.
    pub fn is_active(&self) -> bool {
        self.site.active().is_some_and(|active| active.is(self))
    }

    /// This page or one of its descendants is being visited.
    pub fn is_open(&self) -> bool {
        self.site
            .active()
            .is_some_and(|active| active.is(self) || active.is_descendant_of(self))
    }

    pub fn has_children(&self) -> Result<bool> {
        Ok(!self.children()?.is_empty())
    }

    pub fn has_visible_children(&self) -> Result<bool> {
        Ok(!self.children()?.visible().is_empty())
    }

    pub fn has_files(&self) -> Result<bool> {
        Ok(!self.files()?.is_empty())
    }

    pub fn has_images(&self) -> Result<bool> {
        Ok(!self.files()?.images().is_empty())
    }

    // =========================================================================
    // Search annotations
    // =========================================================================

    pub fn search_hits(&self) -> usize {
        self.node().search.get().map(|m| m.hits).unwrap_or(0)
    }

    pub fn search_score(&self) -> u32 {
        self.node().search.get().map(|m| m.score).unwrap_or(0)
    }

    pub(crate) fn mark_search(&self, mark: Option<SearchMark>) {
        self.node().search.set(mark);
    }

    // =========================================================================
    // Export
    // =========================================================================

    pub fn to_array(&self) -> Result<Map<String, Value>> {
        let content: Map<String, Value> = self
            .content()?
            .to_array()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        let files: Vec<Value> = self.files()?.values().map(|f| Value::Object(f.to_array())).collect();
        let children: Vec<String> = self.children()?.keys().map(str::to_string).collect();
        let modified = self
            .modified()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());

        let mut map = Map::new();
        map.insert("id".into(), json!(self.id()));
        map.insert("uid".into(), json!(self.uid()));
        map.insert("num".into(), json!(self.num()));
        map.insert("dirname".into(), json!(self.dirname()));
        map.insert("diruri".into(), json!(self.diruri()));
        map.insert("url".into(), json!(self.url()));
        map.insert("depth".into(), json!(self.depth()));
        map.insert("visible".into(), json!(self.is_visible()));
        map.insert("hash".into(), json!(self.hash()));
        map.insert("modified".into(), json!(modified));
        map.insert("template".into(), json!(self.template()?));
        map.insert("intended_template".into(), json!(self.intended_template()?));
        map.insert("parent".into(), json!(self.parent().map(|p| p.id())));
        map.insert("content".into(), Value::Object(content));
        map.insert("children".into(), json!(children));
        map.insert("files".into(), Value::Array(files));
        Ok(map)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(Value::Object(self.to_array()?).to_string())
    }
}

/// Structural properties shadow content fields of the same name, so
/// `sort_by_field("num", ...)` sorts by position, not by a `Num:` field.
impl ContentBearing for Page<'_> {
    fn field(&self, key: &str) -> Option<Field> {
        let value = match key {
            "id" | "uri" => self.id(),
            "uid" | "slug" => self.uid(),
            "num" => self.num().map(|n| n.to_string()).unwrap_or_default(),
            "dirname" => self.dirname(),
            "depth" => self.depth().to_string(),
            "url" => self.url(),
            "template" => self.template().ok()?,
            "visible" => self.is_visible().to_string(),
            "search_hits" => self.search_hits().to_string(),
            "search_score" => self.search_score().to_string(),
            _ => return self.content().ok()?.get(key).cloned(),
        };
        Some(Field::new(key, value))
    }
}

/// Join two uri parts, dropping the slash when either is empty.
pub(crate) fn join_id(parent: &str, uid: &str) -> String {
    match (parent.is_empty(), uid.is_empty()) {
        (true, _) => uid.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{parent}/{uid}"),
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::registry::Registry;
    use crate::test_helpers::{ContentTree, find};

    fn blog_tree() -> ContentTree {
        ContentTree::new()
            .page("site", &[("title", "My Site")])
            .page("1-home/home", &[("title", "Home")])
            .page("error/error", &[("title", "Oops")])
            .page("2-blog/blog", &[("title", "Blog")])
            .page("2-blog/1-first/article", &[("title", "First"), ("text", "Hello")])
            .page("2-blog/2-second/article", &[("title", "Second")])
            .page("2-blog/draft/article", &[("title", "Draft")])
            .page("2-blog/3-third/article", &[("title", "Third")])
            .file("2-blog/1-first/photo.jpg", "x")
            .file("2-blog/1-first/photo.txt", "Caption: Sunset")
            .file("2-blog/1-first/notes.pdf", "x")
    }

    #[test]
    fn identity_from_dirname() {
        let tree = blog_tree();
        let site = tree.site();
        let first = find(&site, "blog/first");
        assert_eq!(first.uid(), "first");
        assert_eq!(first.num(), Some(1));
        assert_eq!(first.dirname(), "1-first");
        assert_eq!(first.id(), "blog/first");
        assert_eq!(first.depth(), 2);
        assert_eq!(first.root(), tree.path().join("2-blog/1-first"));
        assert_eq!(first.diruri(), "2-blog/1-first");
        assert!(first.is_visible());

        let draft = find(&site, "blog/draft");
        assert_eq!(draft.num(), None);
        assert!(draft.is_invisible());
    }

    #[test]
    fn root_is_site() {
        let tree = blog_tree();
        let site = tree.site();
        let root = site.root_page();
        assert!(root.is_site());
        assert_eq!(root.id(), "");
        assert_eq!(root.depth(), 0);
        assert_eq!(root.parent(), None);
        assert_eq!(root.intended_template().unwrap(), "site");
        assert_eq!(root.title(), "My Site");
    }

    #[test]
    fn urls() {
        let tree = blog_tree();
        let config = SiteConfig {
            url: "https://example.com/".into(),
            ..SiteConfig::default()
        };
        let site = tree.site_with(config);
        assert_eq!(find(&site, "blog/first").url(), "https://example.com/blog/first");
        assert_eq!(find(&site, "home").url(), "https://example.com");

        let files = find(&site, "blog/first").files().unwrap();
        let name = tree.path().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(
            files.find("photo.jpg").unwrap().url(),
            format!("https://example.com/{name}/2-blog/1-first/photo.jpg")
        );
    }

    #[test]
    fn urls_without_base() {
        let tree = blog_tree();
        let site = tree.site();
        assert_eq!(find(&site, "blog").url(), "/blog");
        assert_eq!(find(&site, "home").url(), "/");
    }

    #[test]
    fn content_and_title() {
        let tree = blog_tree();
        let site = tree.site();
        let first = find(&site, "blog/first");
        assert_eq!(first.field("text").unwrap().value(), "Hello");
        assert_eq!(first.title(), "First");
        assert_eq!(first.intended_template().unwrap(), "article");
        assert!(first.content_file().unwrap().ends_with("article.txt"));
    }

    #[test]
    fn title_falls_back_to_uid() {
        let tree = ContentTree::new().page("1-bare/default", &[]);
        let site = tree.site();
        assert_eq!(find(&site, "bare").title(), "bare");
    }

    #[test]
    fn page_without_content_file() {
        let tree = ContentTree::new().dir("1-empty");
        let site = tree.site();
        let page = find(&site, "empty");
        assert_eq!(page.intended_template().unwrap(), "default");
        assert!(page.content().unwrap().is_empty());
    }

    #[test]
    fn structural_fields_shadow_content() {
        let tree = ContentTree::new().page("3-a/default", &[("num", "99"), ("uid", "zzz")]);
        let site = tree.site();
        let page = find(&site, "a");
        assert_eq!(page.field("num").unwrap().value(), "3");
        assert_eq!(page.field("uid").unwrap().value(), "a");
    }

    #[test]
    fn files_with_meta() {
        let tree = blog_tree();
        let site = tree.site();
        let first = find(&site, "blog/first");
        let files = first.files().unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["notes.pdf", "photo.jpg"]);
        assert_eq!(files.find("photo.jpg").unwrap().field("caption").unwrap().value(), "Sunset");
        assert!(first.has_images().unwrap());
        assert!(!find(&site, "blog/second").has_files().unwrap());
    }

    #[test]
    fn parents_nearest_first() {
        let tree = ContentTree::new().page("1-a/2-b/3-c/default", &[]);
        let site = tree.site();
        let c = find(&site, "a/b/c");
        assert_eq!(c.parents().keys().collect::<Vec<_>>(), vec!["a/b", "a"]);
        assert!(find(&site, "a").parents().is_empty());
    }

    #[test]
    fn next_and_prev_among_siblings() {
        let tree = blog_tree();
        let site = tree.site();
        // numbered dirnames sort before unnumbered ones: first, second, third, draft
        let second = find(&site, "blog/second");
        assert_eq!(second.next().unwrap().unwrap().uid(), "third");
        assert_eq!(second.prev().unwrap().unwrap().uid(), "first");

        let first = find(&site, "blog/first");
        assert!(first.prev().unwrap().is_none());
        assert_eq!(first.next_invisible().unwrap().unwrap().uid(), "draft");

        let third = find(&site, "blog/third");
        assert!(third.next_visible().unwrap().is_none());
        assert!(third.prev_invisible().unwrap().is_none());

        let draft = find(&site, "blog/draft");
        assert_eq!(draft.prev_visible().unwrap().unwrap().uid(), "third");
        assert!(!draft.has_next().unwrap());
        assert!(draft.has_prev().unwrap());
    }

    #[test]
    fn next_in_unrelated_collection_is_none() {
        let tree = blog_tree();
        let site = tree.site();
        let first = find(&site, "blog/first");
        let top = site.children().unwrap();
        assert_eq!(first.next_in(&top, None), None);
    }

    #[test]
    fn siblings_with_and_without_self() {
        let tree = blog_tree();
        let site = tree.site();
        let first = find(&site, "blog/first");
        assert_eq!(first.siblings(true).unwrap().len(), 4);
        let others = first.siblings(false).unwrap();
        assert_eq!(others.len(), 3);
        assert!(!others.has(&first));
    }

    #[test]
    fn relationship_predicates() {
        let tree = blog_tree();
        let site = tree.site();
        let blog = find(&site, "blog");
        let first = find(&site, "blog/first");
        let root = site.root_page();

        assert!(first.is_child_of(&blog));
        assert!(blog.is_parent_of(&first));
        assert!(first.is_descendant_of(&blog));
        assert!(!first.is_descendant_of(&root));
        assert!(!root.is_ancestor_of(&first));
        assert!(blog.is_ancestor_of(&first));
        assert!(!first.is_descendant_of(&first));
        assert!(!first.is_child_of(&first));
        assert!(!blog.is_child_of(&first));
    }

    #[test]
    fn home_and_error_predicates() {
        let tree = blog_tree();
        let site = tree.site();
        assert!(find(&site, "home").is_home_page());
        assert!(find(&site, "error").is_error_page());
        assert!(!find(&site, "blog").is_home_page());
    }

    #[test]
    fn active_and_open() {
        let tree = blog_tree();
        let site = tree.site();
        site.visit("blog/first").unwrap();
        assert!(find(&site, "blog/first").is_active());
        assert!(find(&site, "blog").is_open());
        assert!(!find(&site, "blog").is_active());
        assert!(!find(&site, "home").is_open());
    }

    #[test]
    fn template_falls_back_to_default() {
        let tree = blog_tree();
        let mut registry = Registry::new();
        registry.register("default", None);
        registry.register("blog", None);
        let site = tree.site().with_registry(registry);

        assert_eq!(find(&site, "blog").template().unwrap(), "blog");
        let first = find(&site, "blog/first");
        assert_eq!(first.intended_template().unwrap(), "article");
        assert_eq!(first.template().unwrap(), "default");
    }

    fn negotiating_site(tree: &ContentTree, negotiate: bool) -> Site {
        let mut config = SiteConfig::default();
        config.templates.negotiate = negotiate;
        let mut registry = Registry::new();
        registry.register("article", None);
        registry.register_representation("article", "json", "application/json", None);
        registry.register_representation("article", "xml", "application/xml", None);
        tree.site_with(config).with_registry(registry)
    }

    #[test]
    fn explicit_representation_wins() {
        let tree = blog_tree();
        let site = negotiating_site(&tree, true);
        let first = find(&site, "blog/first");
        let chosen = first.representation(Some("xml"), Some("application/json")).unwrap();
        assert_eq!(chosen.unwrap().suffix, "xml");
        assert_eq!(first.representation(Some("rss"), None).unwrap(), None);
    }

    #[test]
    fn accept_header_negotiation() {
        let tree = blog_tree();
        let site = negotiating_site(&tree, true);
        let first = find(&site, "blog/first");

        let json = first
            .representation(None, Some("application/xml;q=0.5, application/json"))
            .unwrap();
        assert_eq!(json.unwrap().suffix, "json");

        let tie = first.representation(None, Some("application/*")).unwrap();
        assert_eq!(tie.unwrap().suffix, "json");

        assert_eq!(first.representation(None, Some("text/html")).unwrap(), None);
    }

    #[test]
    fn negotiation_disabled_ignores_accept() {
        let tree = blog_tree();
        let site = negotiating_site(&tree, false);
        let first = find(&site, "blog/first");
        assert_eq!(first.representation(None, Some("application/json")).unwrap(), None);
    }

    #[test]
    fn hash_is_stable() {
        let tree = blog_tree();
        let site = tree.site();
        let first = find(&site, "blog/first");
        assert_eq!(first.hash(), first.hash());
        assert_eq!(first.hash().len(), 64);
        assert_ne!(first.hash(), find(&site, "blog").hash());
    }

    #[test]
    fn to_array_exports_tree_data() {
        let tree = blog_tree();
        let site = tree.site();
        let data = find(&site, "blog/first").to_array().unwrap();
        assert_eq!(data["id"], "blog/first");
        assert_eq!(data["num"], 1);
        assert_eq!(data["content"]["title"], "First");
        assert_eq!(data["parent"], "blog");
        assert_eq!(data["files"].as_array().unwrap().len(), 2);

        let json = find(&site, "blog").to_json().unwrap();
        assert!(json.contains("\"children\":[\"blog/first\""));
    }

    #[test]
    fn join_id_handles_root() {
        assert_eq!(join_id("", "blog"), "blog");
        assert_eq!(join_id("blog", "first"), "blog/first");
        assert_eq!(join_id("blog", ""), "blog");
    }
}
