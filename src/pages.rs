//! Collections of pages.
//!
//! [`Pages`] is a [`Collection`] of page handles keyed by page id. A
//! collection obtained from [`Page::children`] remembers that page as its
//! *scope*: relative lookups (`find("first")`) are resolved against it, and
//! derived views (`visible()`, `sort_by_field(...)`) keep it.

use crate::collection::{Collection, Direction, FilterOp, Pagination};
use crate::content::ContentBearing;
use crate::error::{Lookup, Result};
use crate::page::{Page, PageId, Visibility, join_id};
use crate::search::{SearchOptions, search};
use crate::site::Site;
use indexmap::IndexMap;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

type IndexCell = Rc<OnceCell<Rc<Vec<PageId>>>>;

/// Where a collection keeps its memoized index.
#[derive(Clone)]
enum Memo {
    /// The unfiltered children of a page. While `children` is still the
    /// list cached on that page, the index lives in the page's cache and is
    /// dropped by its reset; once a reset replaces the list, `local` is used.
    Node {
        parent: PageId,
        children: Rc<Vec<PageId>>,
        local: IndexCell,
    },
    Local(IndexCell),
}

impl Memo {
    fn local() -> Self {
        Memo::Local(Rc::new(OnceCell::new()))
    }
}

#[derive(Clone)]
pub struct Pages<'s> {
    site: &'s Site,
    scope: Option<PageId>,
    items: Collection<Page<'s>>,
    memo: Memo,
}

impl fmt::Debug for Pages<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.keys()).finish()
    }
}

impl<'s> Pages<'s> {
    /// An empty, unscoped collection.
    pub fn new(site: &'s Site) -> Self {
        Self {
            site,
            scope: None,
            items: Collection::new(),
            memo: Memo::local(),
        }
    }

    pub(crate) fn from_ids(site: &'s Site, scope: Option<PageId>, ids: &[PageId]) -> Self {
        let items = ids
            .iter()
            .map(|&id| Page::new(site, id))
            .map(|page| (page.id(), page))
            .collect();
        Self {
            site,
            scope,
            items,
            memo: Memo::local(),
        }
    }

    pub(crate) fn children_of(site: &'s Site, parent: PageId, ids: Rc<Vec<PageId>>) -> Self {
        Self {
            memo: Memo::Node {
                parent,
                children: ids.clone(),
                local: Rc::new(OnceCell::new()),
            },
            ..Self::from_ids(site, Some(parent), &ids)
        }
    }

    /// A view over `items` that keeps this collection's scope.
    fn derive(&self, items: Collection<Page<'s>>) -> Self {
        Self {
            site: self.site,
            scope: self.scope,
            items,
            memo: Memo::local(),
        }
    }

    pub fn site(&self) -> &'s Site {
        self.site
    }

    /// The page whose children these are, if any.
    pub fn scope(&self) -> Option<Page<'s>> {
        self.scope.map(|id| Page::new(self.site, id))
    }

    pub fn as_collection(&self) -> &Collection<Page<'s>> {
        &self.items
    }

    pub fn into_collection(self) -> Collection<Page<'s>> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Page<'s>> + '_ {
        self.items.values().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &Page<'s>> {
        self.items.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys()
    }

    pub fn first(&self) -> Option<Page<'s>> {
        self.items.first().copied()
    }

    pub fn last(&self) -> Option<Page<'s>> {
        self.items.last().copied()
    }

    pub fn nth(&self, index: usize) -> Option<Page<'s>> {
        self.items.nth(index).copied()
    }

    /// Member by exact id.
    pub fn get(&self, id: &str) -> Option<Page<'s>> {
        self.items.get(id).copied()
    }

    pub fn has(&self, page: &Page<'_>) -> bool {
        self.items.get(&page.id()).is_some_and(|p| p.is(page))
    }

    pub fn index_of(&self, page: &Page<'_>) -> Option<usize> {
        if !self.has(page) {
            return None;
        }
        self.items.index_of(&page.id())
    }

    /// Add `page` at the end (or keep its position if already present).
    pub fn insert(&mut self, page: Page<'s>) {
        self.items.insert(page.id(), page);
        self.memo = Memo::local();
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn filter(&self, predicate: impl FnMut(&Page<'s>) -> bool) -> Self {
        self.derive(self.items.filter(predicate))
    }

    pub fn without(&self, predicate: impl FnMut(&Page<'s>) -> bool) -> Self {
        self.derive(self.items.without(predicate))
    }

    /// Drop the pages with the given ids.
    pub fn not<S: AsRef<str>>(&self, ids: &[S]) -> Self {
        self.derive(self.items.not(ids))
    }

    pub fn not_page(&self, page: &Page<'_>) -> Self {
        self.without(|p| p.is(page))
    }

    pub fn slice(&self, offset: usize, limit: Option<usize>) -> Self {
        self.derive(self.items.slice(offset, limit))
    }

    pub fn offset(&self, offset: usize) -> Self {
        self.derive(self.items.offset(offset))
    }

    pub fn limit(&self, limit: usize) -> Self {
        self.derive(self.items.limit(limit))
    }

    pub fn flip(&self) -> Self {
        self.derive(self.items.flip())
    }

    pub fn sort_by(&self, cmp: impl FnMut(&Page<'s>, &Page<'s>) -> Ordering) -> Self {
        self.derive(self.items.sort_by(cmp))
    }

    pub fn filter_by(&self, field: &str, op: FilterOp, value: &str) -> Self {
        self.derive(self.items.filter_by(field, op, value))
    }

    pub fn sort_by_field(&self, field: &str, direction: Direction) -> Self {
        self.derive(self.items.sort_by_field(field, direction))
    }

    pub fn group_by(&self, key: impl FnMut(&Page<'s>) -> String) -> IndexMap<String, Self> {
        self.items
            .group_by(key)
            .into_iter()
            .map(|(group, items)| (group, self.derive(items)))
            .collect()
    }

    pub fn paginate(&self, limit: usize, page: usize) -> (Self, Pagination) {
        let paginated = self.items.paginate(limit, page);
        (self.derive(paginated.items), paginated.pagination)
    }

    pub fn visible(&self) -> Self {
        self.filter(|p| p.is_visible())
    }

    pub fn invisible(&self) -> Self {
        self.filter(|p| p.is_invisible())
    }

    pub(crate) fn with_visibility(&self, visibility: Visibility) -> Self {
        match visibility {
            Visibility::Visible => self.visible(),
            Visibility::Invisible => self.invisible(),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    fn qualify(&self, uri: &str) -> String {
        match self.scope() {
            Some(scope) => join_id(&scope.id(), uri),
            None => uri.to_string(),
        }
    }

    /// Resolve a uri relative to this collection's scope.
    ///
    /// The full id is tried first; otherwise the uri is walked one segment
    /// at a time, starting in this collection and descending through
    /// children.
    pub fn find(&self, uri: &str) -> Lookup<Page<'s>> {
        let uri = uri.trim_matches('/');
        if uri.is_empty() {
            return Lookup::NotFound;
        }
        if let Some(page) = self.get(&self.qualify(uri)) {
            return Lookup::Found(page);
        }

        let mut level = self.clone();
        let mut found: Option<Page<'s>> = None;
        for segment in uri.split('/') {
            if let Some(page) = found {
                level = match page.children() {
                    Ok(children) => children,
                    Err(err) => return Lookup::IoError(err.to_string()),
                };
            }
            match level.get(&level.qualify(segment)) {
                Some(page) => found = Some(page),
                None => return Lookup::NotFound,
            }
        }
        found.map_or(Lookup::NotFound, Lookup::Found)
    }

    /// Every uri that resolves, in argument order.
    pub fn find_many<S: AsRef<str>>(&self, uris: &[S]) -> Self {
        let mut pages = Pages::new(self.site);
        for uri in uris {
            if let Lookup::Found(page) = self.find(uri.as_ref()) {
                pages.insert(page);
            }
        }
        pages
    }

    /// Walk the uri by slug, segment by segment.
    ///
    /// The walk stops at the first segment without a match; the deepest page
    /// reached is returned only if its slug equals the uri's last segment.
    pub fn find_by_uri(&self, uri: &str) -> Lookup<Page<'s>> {
        let segments: Vec<&str> = uri.split('/').filter(|s| !s.is_empty()).collect();
        let Some(&last) = segments.last() else {
            return Lookup::NotFound;
        };

        let mut level = self.clone();
        let mut found: Option<Page<'s>> = None;
        for segment in &segments {
            let Some(next) = level.iter().find(|p| p.slug() == *segment) else {
                break;
            };
            found = Some(next);
            level = match next.children() {
                Ok(children) => children,
                Err(err) => return Lookup::IoError(err.to_string()),
            };
        }

        match found {
            Some(page) if page.slug() == last => Lookup::Found(page),
            _ => Lookup::NotFound,
        }
    }

    /// First page whose `field` equals `value`.
    pub fn find_by(&self, field: &str, value: &str) -> Option<Page<'s>> {
        self.iter()
            .find(|p| p.field(field).is_some_and(|f| f.value() == value))
    }

    /// The member that is open (active or an ancestor of the active page).
    pub fn find_open(&self) -> Option<Page<'s>> {
        self.iter().find(|p| p.is_open())
    }

    /// Every page in this collection and below it, depth first, keyed by uri.
    pub fn index(&self) -> Result<Pages<'s>> {
        let ids = match &self.memo {
            Memo::Local(cell) => self.index_in(cell)?,
            Memo::Node {
                parent,
                children,
                local,
            } => {
                let node = self.site.node(*parent);
                let (current, cached) = {
                    let cache = node.cache.borrow();
                    let current = cache
                        .children
                        .as_ref()
                        .is_some_and(|live| Rc::ptr_eq(live, children));
                    (current, cache.index.clone())
                };
                match (current, cached) {
                    (false, _) => self.index_in(local)?,
                    (true, Some(ids)) => ids,
                    (true, None) => {
                        let ids = Rc::new(self.collect_index()?);
                        node.cache.borrow_mut().index = Some(ids.clone());
                        ids
                    }
                }
            }
        };
        Ok(Pages::from_ids(self.site, None, &ids))
    }

    fn index_in(&self, cell: &IndexCell) -> Result<Rc<Vec<PageId>>> {
        if let Some(ids) = cell.get() {
            return Ok(ids.clone());
        }
        let ids = Rc::new(self.collect_index()?);
        let _ = cell.set(ids.clone());
        Ok(ids)
    }

    fn collect_index(&self) -> Result<Vec<PageId>> {
        let mut seen = IndexMap::new();
        for page in self.iter() {
            seen.entry(page.id()).or_insert(page.page_id());
            for descendant in page.children()?.index()?.iter() {
                seen.entry(descendant.id()).or_insert(descendant.page_id());
            }
        }
        Ok(seen.into_values().collect())
    }

    /// Full-text search over these pages; see [`crate::search`].
    pub fn search(&self, query: &str, options: &SearchOptions) -> Pages<'s> {
        search(self, query, options)
    }
}
