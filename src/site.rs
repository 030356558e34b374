//! The site: root of the content tree and owner of every page node.
//!
//! Pages are materialized lazily as the tree is walked and live in an arena
//! for as long as the [`Site`]. Handles ([`Page`]) borrow the site, so the
//! whole tree is single-threaded and needs no locking.

use crate::cache::{FileCache, NullCache, RenderCache};
use crate::config::{self, SiteConfig};
use crate::content::Content;
use crate::error::{Error, Lookup, Result};
use crate::naming::parse_dirname;
use crate::page::{Identity, Page, PageId, PageNode, join_id};
use crate::pages::Pages;
use crate::registry::Registry;
use crate::search::SearchOptions;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;
use walkdir::WalkDir;

pub struct Site {
    root: PathBuf,
    config: SiteConfig,
    registry: Registry,
    cache: Box<dyn RenderCache>,
    nodes: RefCell<Vec<Rc<PageNode>>>,
    by_root: RefCell<HashMap<PathBuf, PageId>>,
    active: Cell<Option<PageId>>,
    breadcrumb: RefCell<Option<Rc<Vec<PageId>>>>,
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("root", &self.root)
            .field("url", &self.config.url)
            .field("nodes", &self.nodes.borrow().len())
            .finish()
    }
}

impl Site {
    /// A site over the content directory `root`, with no templates
    /// registered and no render cache.
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
        let root = root.into();
        let ident = Identity {
            num: None,
            uid: String::new(),
            dirname: dirname_of(&root),
            id: String::new(),
            root: root.clone(),
        };
        let node = Rc::new(PageNode::new(None, 0, ident));
        Self {
            by_root: RefCell::new(HashMap::from([(root.clone(), PageId::ROOT)])),
            root,
            config,
            registry: Registry::new(),
            cache: Box::new(NullCache),
            nodes: RefCell::new(vec![node]),
            active: Cell::new(None),
            breadcrumb: RefCell::new(None),
        }
    }

    /// Load `config_path` (defaults when missing), register the templates it
    /// points at and set up the configured render cache.
    pub fn open(root: impl Into<PathBuf>, config_path: &Path) -> Result<Self> {
        let config = config::load_config(config_path)?;
        let registry = Registry::scan(Path::new(&config.templates.root), &config.templates.extension)?;
        let cache: Box<dyn RenderCache> = if config.cache.enabled {
            Box::new(FileCache::new(&config.cache.root))
        } else {
            Box::new(NullCache)
        };
        Ok(Self::new(root, config).with_registry(registry).with_cache(cache))
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self.reset_templates();
        self
    }

    pub fn with_cache(mut self, cache: Box<dyn RenderCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn options(&self) -> &SiteConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &dyn RenderCache {
        self.cache.as_ref()
    }

    /// The content directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn content_dirname(&self) -> String {
        dirname_of(&self.root)
    }

    /// The configured base url without a trailing slash, `/` when unset.
    pub fn url(&self) -> String {
        let url = self.config.url.trim_end_matches('/');
        if url.is_empty() {
            "/".to_string()
        } else {
            url.to_string()
        }
    }

    // =========================================================================
    // Tree access
    // =========================================================================

    pub fn root_page(&self) -> Page<'_> {
        Page::new(self, PageId::ROOT)
    }

    pub fn page_by_id(&self, id: PageId) -> Option<Page<'_>> {
        let nodes = self.nodes.borrow();
        let node = nodes.get(id.0)?;
        (!node.deleted.get()).then(|| Page::new(self, id))
    }

    pub fn children(&self) -> Result<Pages<'_>> {
        self.root_page().children()
    }

    /// Every page below the root, depth first.
    pub fn index(&self) -> Result<Pages<'_>> {
        self.children()?.index()
    }

    /// Search the whole site with the configured defaults.
    pub fn search(&self, query: &str) -> Result<Pages<'_>> {
        self.search_with(query, &SearchOptions::from(&self.config.search))
    }

    pub fn search_with(&self, query: &str, options: &SearchOptions) -> Result<Pages<'_>> {
        Ok(self.index()?.search(query, options))
    }

    /// The root content file (e.g. `site.txt`).
    pub fn content(&self) -> Result<Rc<Content>> {
        self.root_page().content()
    }

    pub fn find(&self, uri: &str) -> Lookup<Page<'_>> {
        match self.children() {
            Ok(children) => children.find(uri),
            Err(err) => Lookup::IoError(err.to_string()),
        }
    }

    pub fn home_page(&self) -> Result<Page<'_>> {
        let home = &self.config.pages.home;
        self.find(home).into_result(home)
    }

    pub fn error_page(&self) -> Result<Page<'_>> {
        let error = &self.config.pages.error;
        self.find(error).into_result(error)
    }

    /// Make the page at `uri` the active one. An empty uri visits the home
    /// page, an unknown one the error page.
    pub fn visit(&self, uri: &str) -> Result<Page<'_>> {
        let uri = uri.trim_matches('/');
        let page = if uri.is_empty() {
            self.home_page()?
        } else {
            match self.find(uri) {
                Lookup::Found(page) => page,
                Lookup::NotFound => {
                    tracing::debug!(uri, "no such page, visiting the error page");
                    self.error_page()?
                }
                Lookup::IoError(reason) => {
                    return Err(Error::io(&self.root.join(uri), std::io::Error::other(reason)));
                }
            }
        };
        self.active.set(Some(page.page_id()));
        self.breadcrumb.borrow_mut().take();
        Ok(page)
    }

    /// The visited page, if any.
    pub fn active(&self) -> Option<Page<'_>> {
        self.active.get().and_then(|id| self.page_by_id(id))
    }

    /// The visited page, or the home page when nothing was visited.
    pub fn page(&self) -> Result<Page<'_>> {
        match self.active() {
            Some(page) => Ok(page),
            None => self.home_page(),
        }
    }

    /// Home, the active page's ancestors outermost first, then the active
    /// page itself.
    pub fn breadcrumb(&self) -> Result<Pages<'_>> {
        let cached = self.breadcrumb.borrow().clone();
        let ids = match cached {
            Some(ids) => ids,
            None => {
                let page = self.page()?;
                let mut crumb = Pages::new(self);
                crumb.insert(self.home_page()?);
                for parent in page.parents().flip().iter() {
                    crumb.insert(parent);
                }
                crumb.insert(page);
                let ids: Vec<PageId> = crumb.iter().map(|p| p.page_id()).collect();
                let ids = Rc::new(ids);
                *self.breadcrumb.borrow_mut() = Some(ids.clone());
                ids
            }
        };
        Ok(Pages::from_ids(self, None, &ids))
    }

    /// Create a page at `uri`; the parent must already exist.
    pub fn create_page<K, V>(
        &self,
        uri: &str,
        template: &str,
        data: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Page<'_>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let uri = uri.trim_matches('/');
        let (parent, name) = match uri.rsplit_once('/') {
            Some((parent_uri, name)) => match self.find(parent_uri) {
                Lookup::Found(parent) => (parent, name),
                Lookup::NotFound => return Err(Error::ParentNotFound(parent_uri.to_string())),
                Lookup::IoError(reason) => {
                    return Err(Error::io(&self.root.join(parent_uri), std::io::Error::other(reason)));
                }
            },
            None => (self.root_page(), uri),
        };
        parent.create_child(name, template, data)
    }

    /// Newest modification time of anything under the content root.
    pub fn modified(&self) -> Option<SystemTime> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.metadata().ok())
            .filter_map(|meta| meta.modified().ok())
            .max()
    }

    // =========================================================================
    // Arena
    // =========================================================================

    pub(crate) fn node(&self, id: PageId) -> Rc<PageNode> {
        self.nodes.borrow()[id.0].clone()
    }

    /// The node for `dirname` inside `parent`, created on first sight.
    pub(crate) fn materialize(&self, parent: PageId, dirname: &str) -> PageId {
        let parent_node = self.node(parent);
        let (root, parent_id) = {
            let ident = parent_node.ident.borrow();
            (ident.root.join(dirname), ident.id.clone())
        };
        let existing = self.by_root.borrow().get(&root).copied();
        if let Some(id) = existing {
            return id;
        }

        let parsed = parse_dirname(dirname);
        let ident = Identity {
            num: parsed.num,
            id: join_id(&parent_id, &parsed.uid),
            uid: parsed.uid,
            dirname: dirname.to_string(),
            root: root.clone(),
        };
        let node = Rc::new(PageNode::new(Some(parent), parent_node.depth + 1, ident));
        let id = {
            let mut nodes = self.nodes.borrow_mut();
            nodes.push(node);
            PageId(nodes.len() - 1)
        };
        self.by_root.borrow_mut().insert(root, id);
        parent_node.kids.borrow_mut().push(id);
        id
    }

    /// Give a page a new name after its directory was renamed, and carry
    /// the new path down to every materialized descendant.
    pub(crate) fn relocate(&self, id: PageId, num: Option<u32>, uid: String, dirname: String) {
        let node = self.node(id);
        {
            let mut ident = node.ident.borrow_mut();
            ident.num = num;
            ident.uid = uid;
            ident.dirname = dirname;
        }
        self.rebase(id);
    }

    /// Recompute root and id from the parent, recursively.
    fn rebase(&self, id: PageId) {
        let node = self.node(id);
        let Some(parent) = node.parent else {
            return;
        };
        let (parent_root, parent_id) = {
            let ident = self.node(parent).ident.borrow().clone();
            (ident.root, ident.id)
        };
        let old_root = {
            let mut ident_ref = node.ident.borrow_mut();
            let ident = &mut *ident_ref;
            let old_root = std::mem::replace(&mut ident.root, parent_root.join(&ident.dirname));
            ident.id = join_id(&parent_id, &ident.uid);
            old_root
        };
        {
            let mut by_root = self.by_root.borrow_mut();
            by_root.remove(&old_root);
            by_root.insert(node.ident.borrow().root.clone(), id);
        }
        node.clear();
        let kids = node.kids.borrow().clone();
        for kid in kids {
            self.rebase(kid);
        }
    }

    /// Drop a deleted page and its materialized descendants from the tree.
    pub(crate) fn forget(&self, id: PageId) {
        let node = self.node(id);
        if let Some(parent) = node.parent {
            self.node(parent).kids.borrow_mut().retain(|&kid| kid != id);
        }
        self.forget_subtree(id);
        if self.active.get().is_some_and(|active| self.node(active).deleted.get()) {
            self.active.set(None);
        }
        self.breadcrumb.borrow_mut().take();
    }

    fn forget_subtree(&self, id: PageId) {
        let node = self.node(id);
        node.deleted.set(true);
        node.clear();
        self.by_root.borrow_mut().remove(&node.ident.borrow().root);
        let kids = node.kids.borrow().clone();
        for kid in kids {
            self.forget_subtree(kid);
        }
    }

    /// Flush the render cache; failures are logged and otherwise ignored.
    pub(crate) fn flush_cache(&self) {
        if let Err(err) = self.cache.flush() {
            tracing::warn!(error = %err, "render cache flush failed");
        }
    }

    fn reset_templates(&self) {
        for node in self.nodes.borrow().iter() {
            let mut cache = node.cache.borrow_mut();
            cache.template = None;
            cache.representations.clear();
        }
    }
}

fn dirname_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::test_helpers::{ContentTree, find};

    fn tree() -> ContentTree {
        ContentTree::new()
            .page("site", &[("title", "Site")])
            .page("1-home/home", &[("title", "Home")])
            .page("error/error", &[("title", "Error")])
            .page("2-blog/blog", &[("title", "Blog")])
            .page("2-blog/1-post/article", &[("title", "Post")])
    }

    fn ids(pages: &Pages<'_>) -> Vec<String> {
        pages.keys().map(str::to_string).collect()
    }

    #[test]
    fn visit_empty_uri_is_home() {
        let tree = tree();
        let site = tree.site();
        assert_eq!(site.visit("").unwrap().id(), "home");
        assert_eq!(site.visit("/").unwrap().id(), "home");
    }

    #[test]
    fn visit_unknown_uri_is_error_page() {
        let tree = tree();
        let site = tree.site();
        assert_eq!(site.visit("nope/nothing").unwrap().id(), "error");
        assert_eq!(site.active().unwrap().id(), "error");
    }

    #[test]
    fn visit_without_error_page_fails() {
        let tree = ContentTree::new().page("1-home/home", &[]);
        let site = tree.site();
        let err = site.visit("nope").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref uri) if uri == "error"));
    }

    #[test]
    fn page_defaults_to_home() {
        let tree = tree();
        let site = tree.site();
        assert!(site.active().is_none());
        assert_eq!(site.page().unwrap().id(), "home");
        site.visit("blog").unwrap();
        assert_eq!(site.page().unwrap().id(), "blog");
    }

    #[test]
    fn breadcrumb_for_nested_page() {
        let tree = tree();
        let site = tree.site();
        site.visit("blog/post").unwrap();
        assert_eq!(ids(&site.breadcrumb().unwrap()), vec!["home", "blog", "blog/post"]);
    }

    #[test]
    fn breadcrumb_for_home_has_no_duplicate() {
        let tree = tree();
        let site = tree.site();
        site.visit("").unwrap();
        assert_eq!(ids(&site.breadcrumb().unwrap()), vec!["home"]);
    }

    #[test]
    fn breadcrumb_follows_visits() {
        let tree = tree();
        let site = tree.site();
        site.visit("blog/post").unwrap();
        assert_eq!(site.breadcrumb().unwrap().len(), 3);
        site.visit("blog").unwrap();
        assert_eq!(ids(&site.breadcrumb().unwrap()), vec!["home", "blog"]);
    }

    #[test]
    fn site_content_and_url() {
        let tree = tree();
        let site = tree.site();
        assert_eq!(site.content().unwrap().get("title").unwrap().value(), "Site");
        assert_eq!(site.url(), "/");
    }

    #[test]
    fn create_page_resolves_parent() {
        let tree = tree();
        let site = tree.site();
        let page = site
            .create_page("blog/3-Hello World", "article", [("title", "Hello")])
            .unwrap();
        assert_eq!(page.id(), "blog/hello-world");
        assert_eq!(page.num(), Some(3));
        assert!(tree.path().join("2-blog/3-hello-world/article.txt").is_file());
    }

    #[test]
    fn create_page_at_top_level() {
        let tree = tree();
        let site = tree.site();
        let page = site.create_page("contact", "default", [("title", "Contact")]).unwrap();
        assert_eq!(page.id(), "contact");
        assert!(page.is_invisible());
        assert!(site.find("contact").is_found());
    }

    #[test]
    fn create_page_without_parent() {
        let tree = tree();
        let site = tree.site();
        let err = site
            .create_page("missing/child", "default", Vec::<(&str, &str)>::new())
            .unwrap_err();
        assert!(matches!(err, Error::ParentNotFound(ref uri) if uri == "missing"));
    }

    #[test]
    fn modified_sees_new_files() {
        let tree = tree();
        let site = tree.site();
        let before = site.modified().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        std::fs::write(tree.path().join("2-blog/new.txt"), "x").unwrap();
        assert!(site.modified().unwrap() > before);
    }

    #[test]
    fn mutations_flush_render_cache() {
        let tree = tree();
        let cache = Rc::new(MemoryCache::new());
        let site = tree.site().with_cache(Box::new(SharedCache(cache.clone())));
        cache.set("blog", "<html>").unwrap();

        find(&site, "blog").update(crate::page::Update::new().set("title", "New")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn page_by_id_skips_deleted() {
        let tree = tree();
        let site = tree.site();
        let post = find(&site, "blog/post");
        let id = post.page_id();
        post.delete(false).unwrap();
        assert!(site.page_by_id(id).is_none());
    }

    /// Lets a test keep a handle on the cache it hands to the site.
    struct SharedCache(Rc<MemoryCache>);

    impl RenderCache for SharedCache {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> std::io::Result<()> {
            self.0.remove(key)
        }
        fn flush(&self) -> std::io::Result<()> {
            self.0.flush()
        }
    }
}
