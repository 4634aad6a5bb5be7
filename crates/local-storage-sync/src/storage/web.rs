//! Browser `localStorage` / `sessionStorage`.

use serde::Deserialize;
use wasm_bindgen::{JsCast, JsValue};

use super::{KeyValueStore, StorageError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreArea {
    #[default]
    Local,
    Session,
}

impl StoreArea {
    pub fn name(self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

#[derive(Clone)]
pub struct WebStorage {
    area: StoreArea,
    storage: web_sys::Storage,
}

impl WebStorage {
    /// Opens the given storage area of the current window.
    ///
    /// Accessing the area can itself throw (e.g. a `SecurityError` in sandboxed
    /// iframes), and it is absent outside a window context.
    pub fn open(area: StoreArea) -> Result<Self, StorageError> {
        let unavailable = || StorageError::Unavailable {
            store: area.name().to_owned(),
        };
        let window = web_sys::window().ok_or_else(unavailable)?;
        let storage = match area {
            StoreArea::Local => window.local_storage(),
            StoreArea::Session => window.session_storage(),
        };
        match storage {
            Ok(Some(storage)) => Ok(Self { area, storage }),
            Ok(None) => Err(unavailable()),
            Err(error) => Err(to_storage_error(area, "", error)),
        }
    }

    pub fn area(&self) -> StoreArea {
        self.area
    }
}

fn to_storage_error(area: StoreArea, key: &str, error: JsValue) -> StorageError {
    let store = area.name().to_owned();
    match error.dyn_ref::<web_sys::DomException>() {
        Some(exception) => match exception.name().as_str() {
            "QuotaExceededError" | "NS_ERROR_DOM_QUOTA_REACHED" => StorageError::QuotaExceeded {
                store,
                key: key.to_owned(),
            },
            "SecurityError" => StorageError::AccessDenied { store },
            _ => StorageError::Backend(exception.message()),
        },
        None => StorageError::Backend(format!("{error:?}")),
    }
}

impl KeyValueStore for WebStorage {
    fn name(&self) -> &str {
        self.area.name()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|error| to_storage_error(self.area, key, error))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|error| to_storage_error(self.area, key, error))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|error| to_storage_error(self.area, key, error))
    }
}
