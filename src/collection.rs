//! Insertion-ordered keyed collections.
//!
//! [`Collection`] is the container behind every list in the content tree:
//! children, search results, files. Items are keyed by a string (page id,
//! filename) and keep insertion order. Every filtering, sorting or slicing
//! operation returns a *new* collection; the source is never modified.

use crate::content::ContentBearing;
use crate::naming::natural_cmp;
use indexmap::IndexMap;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: IndexMap<String, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first().map(|(_, v)| v)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last().map(|(_, v)| v)
    }

    pub fn nth(&self, index: usize) -> Option<&T> {
        self.items.get_index(index).map(|(_, v)| v)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.items.get_index_of(key)
    }

    pub fn key_of(&self, index: usize) -> Option<&str> {
        self.items.get_index(index).map(|(k, _)| k.as_str())
    }

    // -------------------------------------------------------------------------
    // In-place changes to membership
    // -------------------------------------------------------------------------

    /// Insert or replace; a replaced item keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, item: T) {
        self.items.insert(key.into(), item);
    }

    /// Remove by key, keeping the order of the remaining items.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.items.shift_remove(key)
    }

    pub fn extend(&mut self, other: &Collection<T>) {
        for (key, item) in other.iter() {
            self.items.insert(key.to_string(), item.clone());
        }
    }

    // -------------------------------------------------------------------------
    // Derived views
    // -------------------------------------------------------------------------

    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Self {
        self.items
            .iter()
            .filter(|(_, v)| predicate(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Everything except the given keys.
    pub fn not<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        self.items
            .iter()
            .filter(|(k, _)| !keys.iter().any(|key| key.as_ref() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Everything the predicate rejects.
    pub fn without(&self, mut predicate: impl FnMut(&T) -> bool) -> Self {
        self.filter(|item| !predicate(item))
    }

    pub fn slice(&self, offset: usize, limit: Option<usize>) -> Self {
        let limit = limit.unwrap_or(usize::MAX);
        self.items
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn offset(&self, offset: usize) -> Self {
        self.slice(offset, None)
    }

    pub fn limit(&self, limit: usize) -> Self {
        self.slice(0, Some(limit))
    }

    /// Reverse order.
    pub fn flip(&self) -> Self {
        self.items
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Stable sort with a comparator.
    pub fn sort_by(&self, mut cmp: impl FnMut(&T, &T) -> Ordering) -> Self {
        let mut entries: Vec<(String, T)> = self
            .items
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|(_, a), (_, b)| cmp(a, b));
        entries.into_iter().collect()
    }

    pub fn sort_by_key<K: Ord>(&self, mut key: impl FnMut(&T) -> K) -> Self {
        self.sort_by(|a, b| key(a).cmp(&key(b)))
    }

    /// Group by a computed string key; groups appear in first-seen order.
    pub fn group_by(&self, mut key: impl FnMut(&T) -> String) -> IndexMap<String, Self> {
        let mut groups: IndexMap<String, Self> = IndexMap::new();
        for (k, v) in &self.items {
            groups
                .entry(key(v))
                .or_default()
                .insert(k.clone(), v.clone());
        }
        groups
    }

    /// Split into consecutive collections of at most `size` items.
    pub fn chunk(&self, size: usize) -> Vec<Self> {
        let size = size.max(1);
        let mut chunks = Vec::new();
        let mut offset = 0;
        while offset < self.len() {
            chunks.push(self.slice(offset, Some(size)));
            offset += size;
        }
        chunks
    }

    /// The items on page `page` (1-based) when showing `limit` per page.
    pub fn paginate(&self, limit: usize, page: usize) -> Paginated<T> {
        let pagination = Pagination::new(self.len(), limit, page);
        Paginated {
            items: self.slice(pagination.offset(), Some(pagination.limit)),
            pagination,
        }
    }
}

impl<T: Clone + ContentBearing> Collection<T> {
    /// Keep items whose `field` satisfies `op` against `value`.
    ///
    /// Items without the field compare as if it were empty.
    pub fn filter_by(&self, field: &str, op: FilterOp, value: &str) -> Self {
        self.filter(|item| {
            let actual = item
                .field(field)
                .map(|f| f.value().to_string())
                .unwrap_or_default();
            op.matches(&actual, value)
        })
    }

    /// Sort by a content field using natural, case-insensitive ordering.
    pub fn sort_by_field(&self, field: &str, direction: Direction) -> Self {
        let value = |item: &T| {
            item.field(field)
                .map(|f| f.value().to_lowercase())
                .unwrap_or_default()
        };
        self.sort_by(|a, b| {
            let ord = natural_cmp(&value(a), &value(b));
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        })
    }
}

impl<T> FromIterator<(String, T)> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = (String, T);
    type IntoIter = indexmap::map::IntoIter<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Comparison used by [`Collection::filter_by`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq,
    NotEq,
    /// Case-insensitive substring.
    Contains,
    StartsWith,
    EndsWith,
    /// The field, split on commas, contains `value`.
    In,
    /// Numeric when both sides parse as numbers, natural otherwise.
    Gt,
    Lt,
}

impl FilterOp {
    fn matches(&self, actual: &str, value: &str) -> bool {
        match self {
            FilterOp::Eq => actual == value,
            FilterOp::NotEq => actual != value,
            FilterOp::Contains => actual.to_lowercase().contains(&value.to_lowercase()),
            FilterOp::StartsWith => actual.starts_with(value),
            FilterOp::EndsWith => actual.ends_with(value),
            FilterOp::In => actual.split(',').any(|part| part.trim() == value),
            FilterOp::Gt => compare(actual, value) == Ordering::Greater,
            FilterOp::Lt => compare(actual, value) == Ordering::Less,
        }
    }
}

fn compare(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => natural_cmp(a, b),
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a paginated collection.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Collection<T>,
    pub pagination: Pagination,
}

/// Page arithmetic for a list of `total` items shown `limit` at a time.
///
/// The requested page is clamped into `1..=pages()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub page: usize,
}

impl Pagination {
    pub fn new(total: usize, limit: usize, page: usize) -> Self {
        let limit = limit.max(1);
        let pages = total.div_ceil(limit).max(1);
        Self {
            total,
            limit,
            page: page.clamp(1, pages),
        }
    }

    pub fn pages(&self) -> usize {
        self.total.div_ceil(self.limit).max(1)
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }

    pub fn is_last(&self) -> bool {
        self.page == self.pages()
    }

    pub fn has_next(&self) -> bool {
        !self.is_last()
    }

    pub fn has_prev(&self) -> bool {
        !self.is_first()
    }

    pub fn next_page(&self) -> Option<usize> {
        self.has_next().then_some(self.page + 1)
    }

    pub fn prev_page(&self) -> Option<usize> {
        self.has_prev().then_some(self.page - 1)
    }

    /// 1-based index of the first item on this page, 0 when empty.
    pub fn first_item(&self) -> usize {
        if self.total == 0 { 0 } else { self.offset() + 1 }
    }

    pub fn last_item(&self) -> usize {
        (self.offset() + self.limit).min(self.total)
    }

    /// A window of at most `n` page numbers centred on the current page.
    pub fn range(&self, n: usize) -> std::ops::RangeInclusive<usize> {
        let pages = self.pages();
        let n = n.clamp(1, pages);
        let start = self
            .page
            .saturating_sub(n / 2)
            .max(1)
            .min(pages + 1 - n);
        start..=start + n - 1
    }
}
