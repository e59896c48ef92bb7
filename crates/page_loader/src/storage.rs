//! Session-scoped key/value storage.
//!
//! Storage may be unavailable (private browsing, sandboxed frames). Callers check
//! [`SessionStore::is_available`] and skip the read or write instead of failing.

use core::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use anyhow::{Error, bail};

pub trait SessionStore {
    fn is_available(&self) -> bool;

    /// # Errors
    /// Returns an error when the store is unavailable.
    fn get_item(&self, origin: &str, key: &str) -> Result<Option<String>, Error>;

    /// # Errors
    /// Returns an error when the store is unavailable.
    fn set_item(&self, origin: &str, key: &str, value: &str) -> Result<(), Error>;
}

/// In-memory string key/value store per origin.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    buckets: RefCell<HashMap<String, BTreeMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored for `origin`.
    pub fn len(&self, origin: &str) -> usize {
        self.buckets.borrow().get(origin).map_or(0, BTreeMap::len)
    }
}

impl SessionStore for MemorySessionStore {
    fn is_available(&self) -> bool {
        true
    }

    fn get_item(&self, origin: &str, key: &str) -> Result<Option<String>, Error> {
        Ok(self
            .buckets
            .borrow()
            .get(origin)
            .and_then(|bucket| bucket.get(key))
            .cloned())
    }

    fn set_item(&self, origin: &str, key: &str, value: &str) -> Result<(), Error> {
        self.buckets
            .borrow_mut()
            .entry(origin.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A store that is never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSessionStore;

impl SessionStore for UnavailableSessionStore {
    fn is_available(&self) -> bool {
        false
    }

    fn get_item(&self, _origin: &str, key: &str) -> Result<Option<String>, Error> {
        bail!("session storage unavailable (get {key})")
    }

    fn set_item(&self, _origin: &str, key: &str, _value: &str) -> Result<(), Error> {
        bail!("session storage unavailable (set {key})")
    }
}
