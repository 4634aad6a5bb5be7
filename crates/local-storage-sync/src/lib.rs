//! # local-storage-sync
//!
//! Keeps an element's displayed value and a string key-value store in sync.
//!
//! Attaching an element to a key:
//! 1. probes the store with a throwaway write; if that fails the attach is a no-op,
//! 2. seeds the element from storage (or from an explicit initial value),
//! 3. re-emits `input`/`change` on form controls so existing listeners see the seeded value,
//! 4. saves every committed change back under the key until the handle is destroyed.
//!
//! How an element is read, written and watched depends on its [`Kind`]:
//!
//! | tag | kind | value | watched signal |
//! |---|---|---|---|
//! | `input`, `textarea` | [`Kind::TextInput`] | the control's value | `change` |
//! | `fieldset` | [`Kind::ChoiceGroup`] | the selected radio/checkbox | `change` bubbling from choices |
//! | anything else | [`Kind::GenericContainer`] | text content | character-data mutations |
//!
//! ```
//! use local_storage_sync::platform::host::HostElement;
//! use local_storage_sync::{KeyValueStore, MemoryStorage, SyncEngine};
//!
//! let storage = MemoryStorage::new();
//! let engine = SyncEngine::new(storage.clone());
//! let input = HostElement::input();
//!
//! let mut handle = engine.attach(&input, "username").unwrap();
//! input.commit("alice");
//! assert_eq!(storage.get("username").unwrap().as_deref(), Some("alice"));
//!
//! handle.destroy();
//! ```
//!
//! In the browser, `platform::browser::use_local_storage` is exported to JS as
//! `useLocalStorage(node, params)` and follows the action contract of UI
//! frameworks: it returns an object with `destroy()` and `update(params)`.

pub mod diagnostics;
pub mod element;
pub mod engine;
pub mod kind;
pub mod options;
pub mod platform;
pub mod probe;
mod setter;
pub mod storage;
pub mod watcher;

pub use diagnostics::{DIAGNOSTICS_CAPACITY, Diagnostic, DiagnosticsContext};
pub use element::{Signal, SurfaceElement};
pub use engine::{SyncEngine, SyncHandle};
pub use kind::Kind;
pub use options::SyncOptions;
pub use probe::probe;
pub use storage::{KeyValueStore, MemoryStorage, StorageError};
pub use watcher::Watcher;

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::{StoreArea, WebStorage};
