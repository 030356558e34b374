//! # Flatfile
//!
//! The object model of a flat-file CMS. There is no database: the content
//! directory *is* the data. Directories become pages, text files in a simple
//! delimited format hold their fields, and everything else in a directory is
//! a file attached to that page.
//!
//! ```text
//! content/
//! ├── site.txt                     # site-wide fields
//! ├── 1-home/home.txt              # numbered = visible, template "home"
//! ├── 2-blog/
//! │   ├── blog.txt
//! │   ├── 1-first-post/
//! │   │   ├── article.txt          # Title: ... ---- Text: ...
//! │   │   ├── photo.jpg
//! │   │   └── photo.txt            # meta sidecar for photo.jpg
//! │   └── drafts/                  # no number = invisible
//! └── error/error.txt
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Root of the tree; owns every page node, resolves uris, tracks the visited page |
//! | [`page`] | Page handles: identity, lazy disk-backed members, navigation, mutations |
//! | [`pages`] | Page collections: lookup by uri, index, visibility filters |
//! | [`search`] | Tokenized full-text search with per-field weights |
//! | [`collection`] | Insertion-ordered keyed collection behind every list; pagination |
//! | [`inventory`] | Classifies a directory listing into children, content, meta, thumbs, files |
//! | [`content`] / [`field`] | Parsed content files and their fields |
//! | [`format`] | The delimited `Key: value` / `----` content format |
//! | [`file`] / [`media`] | Files attached to pages; dimensions and embedded metadata |
//! | [`naming`] | `NUM-uid` directory names, slugs, natural ordering |
//! | [`registry`] / [`negotiation`] | Known templates and Accept-header representation choice |
//! | [`cache`] | Render cache flushed by every mutation |
//! | [`config`] | `config.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Arena, Copy Handles
//!
//! A page needs to reach its parent, its children and the site, and the site
//! needs to reach every page. Rather than a web of reference-counted
//! pointers, the [`Site`] keeps every page node it has materialized in an
//! arena and hands out [`Page`] values that are just `(&Site, PageId)`.
//! Parent links are ids; there are no cycles to leak.
//!
//! ## Lazy, Resettable State
//!
//! Nothing is read until asked for. A page lists its directory on first use,
//! parses its content file on first use, and keeps both until
//! [`Page::reset`] clears them, together with everything above it in the
//! tree. Mutations do exactly that, so the in-memory view never disagrees
//! with what is on disk after a write.
//!
//! ## Misses Are Not Errors
//!
//! Looking up a uri that names no page returns [`Lookup::NotFound`]; only a
//! directory that can't be read surfaces as [`Lookup::IoError`]. Mutations
//! return [`Result`] with a dedicated [`Error`] variant per refusal.

pub mod cache;
pub mod collection;
pub mod config;
pub mod content;
pub mod error;
pub mod field;
pub mod file;
pub mod format;
pub mod inventory;
pub mod media;
pub mod naming;
pub mod negotiation;
pub mod output;
pub mod page;
pub mod pages;
pub mod registry;
pub mod search;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use collection::{Collection, Direction, FilterOp, Pagination};
pub use config::SiteConfig;
pub use content::{Content, ContentBearing};
pub use error::{Error, Lookup, Result};
pub use field::Field;
pub use file::{File, Files};
pub use page::{Page, PageId, Update, Visibility};
pub use pages::Pages;
pub use registry::Registry;
pub use search::SearchOptions;
pub use site::Site;
