//! The surface the sync engine needs from an attachable element.

/// Signals re-emitted after seeding so existing listeners see the seeded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Fires on every edit.
    Input,
    /// Fires when the user commits a value (blur after edit, picking an option).
    Change,
}

impl Signal {
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
        }
    }
}

/// An element that can be attached to a store.
///
/// Implementations are cheap handles onto a shared element (like `web_sys`
/// types), so `Clone` never copies the element itself.
pub trait SurfaceElement: Clone + 'static {
    /// Keeps a subscription alive; dropping it releases the listener or observer.
    type Subscription: 'static;

    fn tag_name(&self) -> String;

    /// Current value of a form control. Empty for elements without one.
    fn value(&self) -> String;

    fn set_value(&self, value: &str);

    /// Radio buttons and checkboxes inside a group.
    fn selectables(&self) -> Vec<Self>;

    fn set_selected(&self, selected: bool);

    fn text_content(&self) -> Option<String>;

    fn set_text_content(&self, text: &str);

    /// Dispatches a synthetic, bubbling signal on the element.
    fn emit(&self, signal: Signal);

    /// Calls `handler` with the originating element's value whenever a
    /// `change` signal reaches this element, including ones bubbling up from
    /// descendants.
    fn on_commit(&self, handler: Box<dyn FnMut(String)>) -> Self::Subscription;

    /// Calls `handler` after character data anywhere in the subtree changed.
    /// Attribute and child-list mutations are not reported, and a single call
    /// may stand for several mutations.
    fn on_text_mutation(&self, handler: Box<dyn FnMut()>) -> Self::Subscription;
}
