//! String key-value stores the sync engine reads from and writes to.
//!
//! Every operation is fallible: browsers throw on a full quota or when storage
//! is disabled by privacy settings, and the engine has to survive both.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use web::{StoreArea, WebStorage};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage `{store}` is not available in this environment")]
    Unavailable { store: String },
    #[error("storage `{store}` quota exceeded while writing '{key}'")]
    QuotaExceeded { store: String, key: String },
    #[error("access to storage `{store}` denied")]
    AccessDenied { store: String },
    #[error("invalid storage key '{key}'")]
    InvalidKey { key: String },
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A plain string key-value store.
///
/// Values are never structured: whatever the element displays is stored as-is.
pub trait KeyValueStore {
    /// Human-readable store name, used in diagnostics.
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process store. Clones share the same entries.
///
/// Mirrors the failure modes of browser storage: an optional byte quota
/// (counted over keys and values) and a switch that makes every operation fail
/// as if storage were disabled.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    unavailable: bool,
}

const MEMORY_STORE_NAME: &str = "memory";

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with [`StorageError::Unavailable`].
    pub fn unavailable() -> Self {
        let storage = Self::new();
        storage.set_unavailable(true);
        storage
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        let storage = Self::new();
        storage.inner.borrow_mut().quota_bytes = Some(quota_bytes);
        storage
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.borrow_mut().unavailable = unavailable;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Snapshot of all entries, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.inner.borrow().unavailable {
            return Err(StorageError::Unavailable {
                store: MEMORY_STORE_NAME.to_owned(),
            });
        }
        Ok(())
    }
}

impl MemoryInner {
    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, value)| existing.len() + value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStorage {
    fn name(&self) -> &str {
        MEMORY_STORE_NAME
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.inner.borrow().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let mut inner = self.inner.borrow_mut();
        if let Some(quota_bytes) = inner.quota_bytes {
            if inner.used_bytes_without(key) + key.len() + value.len() > quota_bytes {
                return Err(StorageError::QuotaExceeded {
                    store: MEMORY_STORE_NAME.to_owned(),
                    key: key.to_owned(),
                });
            }
        }
        inner.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.inner.borrow_mut().entries.remove(key);
        Ok(())
    }
}
