//! Key lookup: where environment values come from
//!
//! The unmarshaller only ever sees an [`EnvReader`]. This module provides the
//! process environment ([`OsEnv`]), an in-memory map ([`MapEnv`]), a wrapper
//! that falls back to `{KEY}_FILE` for mounted secrets ([`FileFallback`]), and
//! a prefixing view used for nested custom unmarshalers ([`Prefixed`]).

use crate::error::Error;
use std::collections::HashMap;
use std::env::{self, VarError};
use std::fmt;
use std::fs;
use std::path::Path;

/// Ability to look up string values by key.
pub trait EnvReader {
    /// Value registered for `key`, or `None` if there is none.
    ///
    /// An empty value is still a value.
    fn lookup_env(&self, key: &str) -> Option<String>;

    /// Whether every key has a value, together with the keys that do not
    /// (in the order given).
    fn has_keys(&self, keys: &[&str]) -> (bool, Vec<String>) {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| self.lookup_env(key).is_none())
            .map(|key| key.to_string())
            .collect();
        (missing.is_empty(), missing)
    }

    /// Why `key` has no value, when the reader knows more than "unset".
    ///
    /// Only consulted after [`lookup_env`](Self::lookup_env) returned `None`.
    fn missing_cause(&self, _key: &str) -> Option<Error> {
        None
    }
}

impl<R: EnvReader + ?Sized> EnvReader for &R {
    fn lookup_env(&self, key: &str) -> Option<String> {
        (**self).lookup_env(key)
    }

    fn has_keys(&self, keys: &[&str]) -> (bool, Vec<String>) {
        (**self).has_keys(keys)
    }

    fn missing_cause(&self, key: &str) -> Option<Error> {
        (**self).missing_cause(key)
    }
}

impl<R: EnvReader + ?Sized> EnvReader for Box<R> {
    fn lookup_env(&self, key: &str) -> Option<String> {
        (**self).lookup_env(key)
    }

    fn has_keys(&self, keys: &[&str]) -> (bool, Vec<String>) {
        (**self).has_keys(keys)
    }

    fn missing_cause(&self, key: &str) -> Option<Error> {
        (**self).missing_cause(key)
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl EnvReader for OsEnv {
    fn lookup_env(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => {
                log::warn!("environment variable '{key}' is not valid unicode, treating it as unset");
                None
            }
        }
    }
}

/// An in-memory set of key/value pairs.
///
/// ```rust
/// use envtag::{EnvReader, MapEnv};
///
/// let env = MapEnv::from([("PORT", "8080")]);
/// assert_eq!(env.lookup_env("PORT").as_deref(), Some("8080"));
/// assert_eq!(env.has_keys(&["PORT", "HOST"]), (false, vec!["HOST".to_string()]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    values: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `KEY=value` pairs from a dotenv file without touching the process
    /// environment.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, dotenvy::Error> {
        let values = dotenvy::from_path_iter(path.as_ref())?.collect::<Result<_, _>>()?;
        Ok(Self { values })
    }

    /// Set `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl EnvReader for MapEnv {
    fn lookup_env(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for MapEnv {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for MapEnv {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.values
            .extend(iter.into_iter().map(|(key, value)| (key.into(), value.into())));
    }
}

/// Reader that falls back to a file for keys the wrapped reader lacks.
///
/// Lookup order for `KEY`:
/// 1. `KEY` in the wrapped reader
/// 2. contents of the file whose path is the value of `KEY_FILE`, trimmed
///
/// This is the convention used for Kubernetes and Docker secrets. A file
/// that cannot be read makes the key unset for [`lookup_env`](EnvReader::lookup_env);
/// the unmarshaller then reports [`Error::FileRead`] with the path and cause.
#[derive(Debug, Clone)]
pub struct FileFallback<R> {
    inner: R,
    suffix: String,
}

impl<R: EnvReader> FileFallback<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            suffix: "_FILE".to_string(),
        }
    }

    /// Use `suffix` instead of `_FILE` to name the path variable.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: EnvReader> FileFallback<R> {
    fn read_file(&self, key: &str) -> Option<Result<String, Error>> {
        let file_key = format!("{key}{}", self.suffix);
        let path = self.inner.lookup_env(&file_key)?;
        Some(
            fs::read_to_string(&path)
                .map(|contents| contents.trim().to_string())
                .map_err(|source| Error::FileRead {
                    name: file_key,
                    path,
                    source,
                }),
        )
    }
}

impl<R: EnvReader> EnvReader for FileFallback<R> {
    fn lookup_env(&self, key: &str) -> Option<String> {
        if let Some(value) = self.inner.lookup_env(key) {
            return Some(value);
        }

        match self.read_file(key)? {
            Ok(contents) => Some(contents),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    fn missing_cause(&self, key: &str) -> Option<Error> {
        if self.inner.lookup_env(key).is_some() {
            return None;
        }
        match self.read_file(key) {
            Some(Err(e)) => Some(e),
            _ => self.inner.missing_cause(key),
        }
    }
}

/// View of another reader with a fixed prefix prepended to every key.
///
/// Custom unmarshalers bound under a tag receive one of these, so the keys
/// they ask for stay relative to where they are mounted.
#[derive(Clone, Copy)]
pub struct Prefixed<'a> {
    inner: &'a dyn EnvReader,
    prefix: &'a str,
}

impl<'a> Prefixed<'a> {
    pub fn new(inner: &'a dyn EnvReader, prefix: &'a str) -> Self {
        Self { inner, prefix }
    }

    pub fn prefix(&self) -> &str {
        self.prefix
    }
}

impl fmt::Debug for Prefixed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prefixed")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl EnvReader for Prefixed<'_> {
    fn lookup_env(&self, key: &str) -> Option<String> {
        self.inner.lookup_env(&format!("{}{key}", self.prefix))
    }

    fn missing_cause(&self, key: &str) -> Option<Error> {
        self.inner.missing_cause(&format!("{}{key}", self.prefix))
    }
}
