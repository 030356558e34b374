//! Crate-wide error type and the lookup result used by tree queries.
//!
//! Hard failures (an OS call that failed, a uid collision, an attempt to
//! delete a protected page) are [`Error`]s. "This uri doesn't name a page" is
//! not an error: lookups return a [`Lookup`] so callers can tell a miss apart
//! from a directory that couldn't be read.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("The uid is missing")]
    MissingUid,
    #[error("A page with the uid '{0}' already exists")]
    DuplicateUid(String),
    #[error("The parent page '{0}' does not exist")]
    ParentNotFound(String),
    #[error("The page '{id}' is protected: {reason}")]
    Protected { id: String, reason: &'static str },
    #[error("The page '{0}' has subpages")]
    HasChildren(String),
    #[error("The page '{0}' could not be found")]
    NotFound(String),
}

impl Error {
    /// Attach the path an OS call was operating on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of resolving a uri against the content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    IoError(String),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::IoError(reason) => Lookup::IoError(reason),
        }
    }

    /// Chain another lookup off a found value.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Lookup<U>) -> Lookup<U> {
        match self {
            Lookup::Found(value) => f(value),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::IoError(reason) => Lookup::IoError(reason),
        }
    }

    /// Turn a miss into [`Error::NotFound`] naming `uri`.
    pub fn into_result(self, uri: &str) -> Result<T> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(Error::NotFound(uri.to_string())),
            Lookup::IoError(reason) => Err(Error::Io {
                path: PathBuf::from(uri),
                source: std::io::Error::other(reason),
            }),
        }
    }
}

impl<T> From<Result<T>> for Lookup<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Lookup::Found(value),
            Err(err) => Lookup::IoError(err.to_string()),
        }
    }
}
