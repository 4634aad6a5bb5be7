//! Host-driven, deterministic element tree.
//!
//! Lets native hosts (and tests) drive the sync engine without a browser. It
//! follows the DOM where the engine can tell the difference:
//! - `change` and `input` signals bubble from the originating element to its
//!   ancestors and handlers can read the originating element.
//! - Editing character data ([`HostElement::edit_text`]) queues one pending
//!   notification per observer; [`flush_mutations`] delivers them, so several
//!   edits before a flush coalesce into one callback.
//! - Replacing content ([`HostElement::set_text_content`]) is a child-list
//!   mutation and is never reported to observers.
//! - Setting values or `checked` programmatically fires nothing.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::element::{Signal, SurfaceElement};

type ListenerFn = Rc<RefCell<dyn FnMut(&HostElement)>>;

#[derive(Clone)]
pub struct HostElement {
    node: Rc<RefCell<Node>>,
}

struct Node {
    tag_name: String,
    input_type: Option<String>,
    name: Option<String>,
    value: String,
    checked: bool,
    text: String,
    parent: Weak<RefCell<Node>>,
    children: Vec<HostElement>,
    listeners: Vec<Listener>,
    observers: Vec<Rc<Observer>>,
    next_subscription_id: u64,
}

struct Listener {
    id: u64,
    signal: Signal,
    handler: ListenerFn,
}

struct Observer {
    id: u64,
    pending: Cell<bool>,
    connected: Cell<bool>,
    handler: RefCell<Box<dyn FnMut()>>,
}

thread_local! {
    static MUTATION_QUEUE: RefCell<Vec<Rc<Observer>>> = const { RefCell::new(Vec::new()) };
}

/// Delivers queued character-data notifications, one per pending observer.
///
/// Returns the number of callbacks run.
pub fn flush_mutations() -> usize {
    let queued = MUTATION_QUEUE.with(|queue| std::mem::take(&mut *queue.borrow_mut()));
    let mut delivered = 0;
    for observer in queued {
        if !observer.connected.get() || !observer.pending.replace(false) {
            continue;
        }
        if let Ok(mut handler) = observer.handler.try_borrow_mut() {
            (&mut *handler)();
            delivered += 1;
        }
    }
    delivered
}

/// Keeps a listener or observer registered; dropping it unregisters.
///
/// Safe to drop after the element itself is gone.
pub struct HostSubscription {
    node: Weak<RefCell<Node>>,
    id: u64,
}

impl Drop for HostSubscription {
    fn drop(&mut self) {
        let Some(node) = self.node.upgrade() else {
            return;
        };
        let mut node = node.borrow_mut();
        node.listeners.retain(|listener| listener.id != self.id);
        node.observers.retain(|observer| {
            if observer.id == self.id {
                observer.connected.set(false);
                false
            } else {
                true
            }
        });
    }
}

impl HostElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            node: Rc::new(RefCell::new(Node {
                tag_name: tag_name.into(),
                input_type: None,
                name: None,
                value: String::new(),
                checked: false,
                text: String::new(),
                parent: Weak::new(),
                children: Vec::new(),
                listeners: Vec::new(),
                observers: Vec::new(),
                next_subscription_id: 0,
            })),
        }
    }

    /// `<input type="text">`
    pub fn input() -> Self {
        let input = Self::new("input");
        input.node.borrow_mut().input_type = Some("text".to_owned());
        input
    }

    pub fn textarea() -> Self {
        Self::new("textarea")
    }

    /// `<input type="{input_type}" name="{name}" value="{value}">`
    pub fn choice(input_type: &str, name: &str, value: &str) -> Self {
        let choice = Self::new("input");
        {
            let mut node = choice.node.borrow_mut();
            node.input_type = Some(input_type.to_owned());
            node.name = Some(name.to_owned());
            node.value = value.to_owned();
        }
        choice
    }

    /// `<fieldset>` with one radio button per value.
    pub fn radio_group(name: &str, values: &[&str]) -> Self {
        let fieldset = Self::new("fieldset");
        for value in values {
            fieldset.append_child(Self::choice("radio", name, value));
        }
        fieldset
    }

    /// `<fieldset>` with one checkbox per value.
    pub fn checkbox_group(name: &str, values: &[&str]) -> Self {
        let fieldset = Self::new("fieldset");
        for value in values {
            fieldset.append_child(Self::choice("checkbox", name, value));
        }
        fieldset
    }

    pub fn append_child(&self, child: HostElement) {
        child.node.borrow_mut().parent = Rc::downgrade(&self.node);
        self.node.borrow_mut().children.push(child);
    }

    pub fn children(&self) -> Vec<HostElement> {
        self.node.borrow().children.clone()
    }

    pub fn parent(&self) -> Option<HostElement> {
        let parent = self.node.borrow().parent.upgrade()?;
        Some(HostElement { node: parent })
    }

    pub fn is_selected(&self) -> bool {
        self.node.borrow().checked
    }

    /// Values of the selected radio buttons / checkboxes in this subtree.
    pub fn selected_values(&self) -> Vec<String> {
        self.selectables()
            .into_iter()
            .filter(HostElement::is_selected)
            .map(|choice| choice.value())
            .collect()
    }

    /// Registers an external listener, as page scripts would.
    /// The handler receives the element the signal originated from.
    pub fn add_listener(
        &self,
        signal: Signal,
        handler: impl FnMut(&HostElement) + 'static,
    ) -> HostSubscription {
        let mut node = self.node.borrow_mut();
        let id = node.next_id();
        node.listeners.push(Listener {
            id,
            signal,
            handler: Rc::new(RefCell::new(handler)),
        });
        HostSubscription {
            node: Rc::downgrade(&self.node),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.node.borrow().listeners.len()
    }

    pub fn observer_count(&self) -> usize {
        self.node.borrow().observers.len()
    }

    /// User types without committing: fires `input` only.
    pub fn type_text(&self, value: &str) {
        self.set_value(value);
        self.dispatch(Signal::Input);
    }

    /// User edits and commits the value: fires `input`, then `change`.
    pub fn commit(&self, value: &str) {
        self.type_text(value);
        self.dispatch(Signal::Change);
    }

    /// User clicks a radio button or checkbox.
    pub fn click(&self) {
        let is_radio = self.node.borrow().input_type.as_deref() == Some("radio");
        let selected = is_radio || !self.is_selected();
        self.set_selected(selected);
        self.dispatch(Signal::Input);
        self.dispatch(Signal::Change);
    }

    /// User edits the element's character data in place (e.g. `contenteditable`).
    pub fn edit_text(&self, text: &str) {
        self.node.borrow_mut().text = text.to_owned();
        let mut current = Some(self.node.clone());
        while let Some(node) = current {
            let node = node.borrow();
            for observer in &node.observers {
                if observer.connected.get() && !observer.pending.replace(true) {
                    MUTATION_QUEUE.with(|queue| queue.borrow_mut().push(observer.clone()));
                }
            }
            current = node.parent.upgrade();
        }
    }

    fn dispatch(&self, signal: Signal) {
        let mut handlers = Vec::new();
        let mut current = Some(self.node.clone());
        while let Some(node) = current {
            let node = node.borrow();
            handlers.extend(
                node.listeners
                    .iter()
                    .filter(|listener| listener.signal == signal)
                    .map(|listener| listener.handler.clone()),
            );
            current = node.parent.upgrade();
        }
        for handler in handlers {
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (&mut *handler)(self);
            }
        }
    }

    fn root(&self) -> HostElement {
        let mut root = self.clone();
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    fn collect_selectables(&self, found: &mut Vec<HostElement>) {
        for child in self.children() {
            let is_choice = matches!(
                child.node.borrow().input_type.as_deref(),
                Some("radio" | "checkbox")
            );
            if is_choice {
                found.push(child.clone());
            }
            child.collect_selectables(found);
        }
    }
}

impl Node {
    fn next_id(&mut self) -> u64 {
        self.next_subscription_id += 1;
        self.next_subscription_id
    }
}

impl SurfaceElement for HostElement {
    type Subscription = HostSubscription;

    fn tag_name(&self) -> String {
        self.node.borrow().tag_name.to_ascii_uppercase()
    }

    fn value(&self) -> String {
        self.node.borrow().value.clone()
    }

    fn set_value(&self, value: &str) {
        self.node.borrow_mut().value = value.to_owned();
    }

    fn selectables(&self) -> Vec<Self> {
        let mut found = Vec::new();
        self.collect_selectables(&mut found);
        found
    }

    fn set_selected(&self, selected: bool) {
        let (is_radio, name) = {
            let node = self.node.borrow();
            (node.input_type.as_deref() == Some("radio"), node.name.clone())
        };
        if is_radio && selected {
            for other in self.root().selectables() {
                let same_group = {
                    let node = other.node.borrow();
                    node.input_type.as_deref() == Some("radio") && node.name == name
                };
                if same_group {
                    other.node.borrow_mut().checked = false;
                }
            }
        }
        self.node.borrow_mut().checked = selected;
    }

    fn text_content(&self) -> Option<String> {
        let node = self.node.borrow();
        let mut text = node.text.clone();
        for child in &node.children {
            text.push_str(&child.text_content().unwrap_or_default());
        }
        Some(text)
    }

    fn set_text_content(&self, text: &str) {
        let mut node = self.node.borrow_mut();
        node.children.clear();
        node.text = text.to_owned();
    }

    fn emit(&self, signal: Signal) {
        self.dispatch(signal);
    }

    fn on_commit(&self, mut handler: Box<dyn FnMut(String)>) -> Self::Subscription {
        self.add_listener(Signal::Change, move |target| handler(target.value()))
    }

    fn on_text_mutation(&self, handler: Box<dyn FnMut()>) -> Self::Subscription {
        let mut node = self.node.borrow_mut();
        let id = node.next_id();
        node.observers.push(Rc::new(Observer {
            id,
            pending: Cell::new(false),
            connected: Cell::new(true),
            handler: RefCell::new(handler),
        }));
        HostSubscription {
            node: Rc::downgrade(&self.node),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_change_bubbles_with_originating_element() {
        let group = HostElement::radio_group("size", &["s", "m", "l"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _subscription = group.on_commit(Box::new({
            let seen = seen.clone();
            move |value: String| seen.borrow_mut().push(value)
        }));
        group.children()[1].click();
        assert_eq!(*seen.borrow(), vec!["m".to_owned()]);
        assert_eq!(group.selected_values(), vec!["m".to_owned()]);
    }

    #[test]
    fn test_typing_does_not_commit() {
        let input = HostElement::input();
        let commits = Rc::new(Cell::new(0));
        let _subscription = input.on_commit(Box::new({
            let commits = commits.clone();
            move |_: String| commits.set(commits.get() + 1)
        }));
        input.type_text("a");
        input.type_text("ab");
        assert_eq!(commits.get(), 0);
        input.commit("abc");
        assert_eq!(commits.get(), 1);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let input = HostElement::input();
        let subscription = input.on_commit(Box::new(|_| {}));
        assert_eq!(input.listener_count(), 1);
        drop(subscription);
        assert_eq!(input.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_element() {
        let subscription = {
            let div = HostElement::new("div");
            div.on_text_mutation(Box::new(|| {}))
        };
        drop(subscription);
    }

    #[test]
    fn test_edits_coalesce_until_flush() {
        let div = HostElement::new("div");
        let span = HostElement::new("span");
        div.append_child(span.clone());
        let calls = Rc::new(Cell::new(0));
        let _subscription = div.on_text_mutation(Box::new({
            let calls = calls.clone();
            move || calls.set(calls.get() + 1)
        }));
        span.edit_text("a");
        span.edit_text("ab");
        div.edit_text("x");
        assert_eq!(flush_mutations(), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(div.text_content().as_deref(), Some("xab"));
        assert_eq!(flush_mutations(), 0);
    }

    #[test]
    fn test_replacing_content_is_not_observed() {
        let div = HostElement::new("div");
        let calls = Rc::new(Cell::new(0));
        let _subscription = div.on_text_mutation(Box::new({
            let calls = calls.clone();
            move || calls.set(calls.get() + 1)
        }));
        div.set_text_content("replaced");
        assert_eq!(flush_mutations(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_disconnected_observer_skips_pending_notification() {
        let div = HostElement::new("div");
        let subscription = div.on_text_mutation(Box::new(|| panic!("disconnected observer called")));
        div.edit_text("x");
        drop(subscription);
        assert_eq!(flush_mutations(), 0);
    }

    #[test]
    fn test_checkboxes_toggle_independently() {
        let group = HostElement::checkbox_group("toppings", &["ham", "olives"]);
        let choices = group.children();
        choices[0].click();
        choices[1].click();
        assert_eq!(group.selected_values(), vec!["ham".to_owned(), "olives".to_owned()]);
        choices[0].click();
        assert_eq!(group.selected_values(), vec!["olives".to_owned()]);
    }
}
