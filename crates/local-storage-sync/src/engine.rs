//! Attach/detach lifecycle: probe, classify, seed, re-emit, watch.

use std::cell::RefCell;
use std::rc::Rc;

use crate::diagnostics::{Diagnostic, DiagnosticsContext, record_shared};
use crate::element::{Signal, SurfaceElement};
use crate::kind::Kind;
use crate::options::SyncOptions;
use crate::probe::probe;
use crate::setter;
use crate::storage::KeyValueStore;
use crate::watcher::{self, Watcher};

/// Binds elements to one store.
///
/// Clones share the store and the diagnostics.
#[derive(Clone)]
pub struct SyncEngine {
    store: Rc<dyn KeyValueStore>,
    diagnostics: Rc<RefCell<DiagnosticsContext>>,
}

impl SyncEngine {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_shared_store(Rc::new(store))
    }

    pub fn with_shared_store(store: Rc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            diagnostics: Rc::new(RefCell::new(DiagnosticsContext::new())),
        }
    }

    pub fn store(&self) -> &Rc<dyn KeyValueStore> {
        &self.store
    }

    /// A snapshot of the diagnostics recorded so far, oldest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().recorded().to_vec()
    }

    /// How many diagnostics were evicted from the snapshot's window.
    pub fn dropped_diagnostics(&self) -> usize {
        self.diagnostics.borrow().dropped()
    }

    pub fn clear_diagnostics(&self) {
        if let Ok(mut diagnostics) = self.diagnostics.try_borrow_mut() {
            diagnostics.clear();
        }
    }

    /// Seeds `element` from storage and starts saving its committed changes.
    ///
    /// Returns `None`, leaving the element untouched, when the store fails the
    /// availability probe. Several elements may be bound to the same key; the
    /// last committed change wins.
    pub fn attach<E: SurfaceElement>(
        &self,
        element: &E,
        options: impl Into<SyncOptions>,
    ) -> Option<SyncHandle<E>> {
        let options = options.into();
        let watcher = self.install(element, &options)?;
        Some(SyncHandle {
            engine: self.clone(),
            element: element.clone(),
            key: Rc::from(options.name()),
            kind: watcher.kind(),
            watcher: Some(watcher),
        })
    }

    fn install<E: SurfaceElement>(&self, element: &E, options: &SyncOptions) -> Option<Watcher<E>> {
        let key = options.name();
        if !probe(&*self.store) {
            record_shared(
                &self.diagnostics,
                Diagnostic::StorageUnavailable {
                    store: self.store.name().to_owned(),
                    key: key.to_owned(),
                },
            );
            return None;
        }

        let kind = Kind::classify(&element.tag_name());
        setter::seed(
            kind,
            element,
            &*self.store,
            key,
            options.init_value(),
            &self.diagnostics,
        );
        // The watcher doesn't exist yet, so these never echo back into storage.
        if kind.reemits_signals() {
            element.emit(Signal::Input);
            element.emit(Signal::Change);
        }
        let watcher = watcher::watch(
            kind,
            element,
            self.store.clone(),
            Rc::from(key),
            self.diagnostics.clone(),
        );
        tracing::debug!(store = self.store.name(), key, ?kind, "attached");
        Some(watcher)
    }
}

/// A live binding between one element and one key.
///
/// The watcher is released by [`SyncHandle::destroy`] or when the handle is
/// dropped, whichever comes first.
pub struct SyncHandle<E: SurfaceElement> {
    engine: SyncEngine,
    element: E,
    key: Rc<str>,
    kind: Kind,
    watcher: Option<Watcher<E>>,
}

impl<E: SurfaceElement> SyncHandle<E> {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stops watching the element. Storage is left as it is.
    pub fn destroy(&mut self) {
        if self.watcher.take().is_some() {
            tracing::debug!(key = %self.key, "detached");
        }
    }

    /// Rebinds the element with new options: detach, then a fresh attach.
    ///
    /// Returns whether the handle is active afterwards; it stays destroyed
    /// when storage became unavailable in between, and [`key`](Self::key) and
    /// [`kind`](Self::kind) keep describing the last successful binding.
    pub fn update(&mut self, options: impl Into<SyncOptions>) -> bool {
        let options = options.into();
        self.destroy();
        self.watcher = self.engine.install(&self.element, &options);
        if let Some(watcher) = &self.watcher {
            self.key = Rc::from(options.name());
            self.kind = watcher.kind();
        }
        self.is_active()
    }
}
