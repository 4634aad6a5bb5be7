//! Watchers turn committed element changes into storage writes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::diagnostics::{Diagnostic, DiagnosticsContext, record_shared};
use crate::element::SurfaceElement;
use crate::kind::Kind;
use crate::storage::KeyValueStore;

/// One installed watcher. Dropping it removes the listener or observer.
pub struct Watcher<E: SurfaceElement> {
    kind: Kind,
    _subscription: E::Subscription,
}

impl<E: SurfaceElement> Watcher<E> {
    pub fn kind(&self) -> Kind {
        self.kind
    }
}

pub(crate) fn watch<E: SurfaceElement>(
    kind: Kind,
    element: &E,
    store: Rc<dyn KeyValueStore>,
    key: Rc<str>,
    diagnostics: Rc<RefCell<DiagnosticsContext>>,
) -> Watcher<E> {
    let subscription = match kind {
        Kind::TextInput | Kind::ChoiceGroup => element.on_commit(Box::new(move |value: String| {
            persist(&*store, &key, &value, &diagnostics);
        })),
        Kind::GenericContainer => {
            let container = element.clone();
            element.on_text_mutation(Box::new(move || {
                // Notifications may be coalesced, so always save the live content.
                let text = container.text_content().unwrap_or_default();
                persist(&*store, &key, &text, &diagnostics);
            }))
        }
    };
    Watcher {
        kind,
        _subscription: subscription,
    }
}

fn persist(
    store: &dyn KeyValueStore,
    key: &str,
    value: &str,
    diagnostics: &RefCell<DiagnosticsContext>,
) {
    match store.set(key, value) {
        Ok(()) => tracing::debug!(store = store.name(), key, "saved committed value"),
        Err(error) => record_shared(diagnostics, Diagnostic::write_failed(key, &error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::host::{HostElement, flush_mutations};
    use crate::storage::MemoryStorage;

    struct Fixture {
        storage: MemoryStorage,
        diagnostics: Rc<RefCell<DiagnosticsContext>>,
    }

    impl Fixture {
        fn new(storage: MemoryStorage) -> Self {
            Self {
                storage,
                diagnostics: Rc::new(RefCell::new(DiagnosticsContext::new())),
            }
        }

        fn watch(&self, element: &HostElement) -> Watcher<HostElement> {
            let kind = Kind::classify(&element.tag_name());
            watch(
                kind,
                element,
                Rc::new(self.storage.clone()),
                Rc::from("key"),
                self.diagnostics.clone(),
            )
        }

        fn stored(&self) -> Option<String> {
            self.storage.get("key").unwrap()
        }
    }

    #[test]
    fn test_text_input_saves_on_commit_only() {
        let fixture = Fixture::new(MemoryStorage::new());
        let input = HostElement::textarea();
        let watcher = fixture.watch(&input);
        assert_eq!(watcher.kind(), Kind::TextInput);

        input.type_text("draf");
        assert_eq!(fixture.stored(), None);
        input.commit("draft");
        assert_eq!(fixture.stored().as_deref(), Some("draft"));
    }

    #[test]
    fn test_choice_group_saves_clicked_value() {
        let fixture = Fixture::new(MemoryStorage::new());
        let group = HostElement::radio_group("plan", &["free", "pro"]);
        let _watcher = fixture.watch(&group);
        group.children()[1].click();
        assert_eq!(fixture.stored().as_deref(), Some("pro"));
    }

    #[test]
    fn test_container_saves_full_text_once_per_flush() {
        let storage = MemoryStorage::new();
        let fixture = Fixture::new(storage.clone());
        let container = HostElement::new("div");
        let word = HostElement::new("span");
        container.append_child(word.clone());
        let _watcher = fixture.watch(&container);

        container.edit_text("Hello ");
        word.edit_text("world");
        assert_eq!(fixture.stored(), None);
        assert_eq!(flush_mutations(), 1);
        assert_eq!(fixture.stored().as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_dropped_watcher_stops_saving() {
        let fixture = Fixture::new(MemoryStorage::new());
        let input = HostElement::input();
        let watcher = fixture.watch(&input);
        drop(watcher);
        input.commit("ignored");
        assert_eq!(fixture.stored(), None);
        assert_eq!(input.listener_count(), 0);
    }

    #[test]
    fn test_failed_write_is_recorded_and_watcher_survives() {
        let storage = MemoryStorage::with_quota(10);
        let fixture = Fixture::new(storage);
        let input = HostElement::input();
        let _watcher = fixture.watch(&input);

        input.commit("far too long for the quota");
        assert_eq!(fixture.stored(), None);
        assert!(matches!(
            fixture.diagnostics.borrow().recorded(),
            [Diagnostic::WriteFailed { key, .. }] if key == "key"
        ));

        input.commit("short");
        assert_eq!(fixture.stored().as_deref(), Some("short"));
    }
}
