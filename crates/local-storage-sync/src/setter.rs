//! Seeding: apply the stored (or overriding) value to the element's displayed
//! state. Setters never write to storage.

use std::cell::RefCell;

use crate::diagnostics::{Diagnostic, DiagnosticsContext, record_shared};
use crate::element::SurfaceElement;
use crate::kind::Kind;
use crate::storage::KeyValueStore;

pub(crate) fn seed<E: SurfaceElement>(
    kind: Kind,
    element: &E,
    store: &dyn KeyValueStore,
    key: &str,
    init_value: Option<&str>,
    diagnostics: &RefCell<DiagnosticsContext>,
) {
    let stored = || read_stored(store, key, diagnostics);
    match kind {
        Kind::TextInput => seed_text_input(element, init_value, stored),
        // Only the stored value selects a choice; `init_value` is not consulted.
        Kind::ChoiceGroup => seed_choice_group(element, stored()),
        Kind::GenericContainer => seed_container(element, init_value, stored),
    }
}

fn read_stored(
    store: &dyn KeyValueStore,
    key: &str,
    diagnostics: &RefCell<DiagnosticsContext>,
) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(error) => {
            record_shared(diagnostics, Diagnostic::read_failed(key, &error));
            None
        }
    }
}

fn seed_text_input<E: SurfaceElement>(
    element: &E,
    init_value: Option<&str>,
    stored: impl FnOnce() -> Option<String>,
) {
    let value = match init_value {
        Some(init_value) => init_value.to_owned(),
        None => stored().unwrap_or_default(),
    };
    element.set_value(&value);
}

fn seed_choice_group<E: SurfaceElement>(element: &E, stored: Option<String>) {
    let Some(stored) = stored else {
        return;
    };
    if let Some(choice) = element
        .selectables()
        .into_iter()
        .find(|choice| choice.value() == stored)
    {
        choice.set_selected(true);
    }
}

fn seed_container<E: SurfaceElement>(
    element: &E,
    init_value: Option<&str>,
    stored: impl FnOnce() -> Option<String>,
) {
    if let Some(init_value) = init_value.filter(|value| !value.is_empty()) {
        element.set_text_content(init_value);
    } else if let Some(stored) = stored().filter(|value| !value.is_empty()) {
        element.set_text_content(&stored);
    }
}
