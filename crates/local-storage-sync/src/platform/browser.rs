//! Browser DOM elements and the `useLocalStorage` action for JS hosts.

use std::cell::{Cell, RefCell};

use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventInit, EventTarget, HtmlInputElement, HtmlTextAreaElement};
use web_sys::{MutationObserver, MutationObserverInit};
use zoon::eprintln;

use crate::element::{Signal, SurfaceElement};
use crate::engine::{SyncEngine, SyncHandle};
use crate::options::SyncOptions;
use crate::storage::{StoreArea, WebStorage};

const SELECTABLES: &str = "input[type=radio], input[type=checkbox]";

/// A DOM element seen through [`SurfaceElement`].
#[derive(Clone)]
pub struct DomElement(Element);

impl DomElement {
    pub fn new(element: Element) -> Self {
        Self(element)
    }

    pub fn element(&self) -> &Element {
        &self.0
    }
}

impl From<Element> for DomElement {
    fn from(element: Element) -> Self {
        Self(element)
    }
}

/// Keeps a DOM listener or observer registered; dropping it unregisters.
pub enum DomSubscription {
    Listener {
        target: EventTarget,
        event_type: &'static str,
        closure: Closure<dyn FnMut(Event)>,
    },
    Observer {
        observer: Option<MutationObserver>,
        _closure: Closure<dyn FnMut()>,
    },
}

impl Drop for DomSubscription {
    fn drop(&mut self) {
        match self {
            Self::Listener {
                target,
                event_type,
                closure,
            } => {
                // Removing from a detached element is fine.
                let _ = target
                    .remove_event_listener_with_callback(*event_type, closure.as_ref().unchecked_ref());
            }
            Self::Observer { observer, .. } => {
                if let Some(observer) = observer {
                    observer.disconnect();
                }
            }
        }
    }
}

fn form_value(target: &JsValue) -> Option<String> {
    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        Some(input.value())
    } else {
        target
            .dyn_ref::<HtmlTextAreaElement>()
            .map(HtmlTextAreaElement::value)
    }
}

impl SurfaceElement for DomElement {
    type Subscription = DomSubscription;

    fn tag_name(&self) -> String {
        self.0.tag_name()
    }

    fn value(&self) -> String {
        form_value(&self.0).unwrap_or_default()
    }

    fn set_value(&self, value: &str) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(textarea) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            textarea.set_value(value);
        }
    }

    fn selectables(&self) -> Vec<Self> {
        let Ok(nodes) = self.0.query_selector_all(SELECTABLES) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(Self)
            .collect()
    }

    fn set_selected(&self, selected: bool) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_checked(selected);
        }
    }

    fn text_content(&self) -> Option<String> {
        self.0.text_content()
    }

    fn set_text_content(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn emit(&self, signal: Signal) {
        let init = EventInit::new();
        init.set_bubbles(true);
        match Event::new_with_event_init_dict(signal.event_type(), &init) {
            Ok(event) => {
                if let Err(error) = self.0.dispatch_event(&event) {
                    eprintln!("Failed to dispatch `{}` event: {error:?}", signal.event_type());
                }
            }
            Err(error) => eprintln!("Failed to create `{}` event: {error:?}", signal.event_type()),
        }
    }

    fn on_commit(&self, mut handler: Box<dyn FnMut(String)>) -> Self::Subscription {
        let event_type = Signal::Change.event_type();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let value = event.target().and_then(|target| form_value(&target));
            if let Some(value) = value {
                handler(value);
            }
        });
        let target: EventTarget = self.0.clone().into();
        if let Err(error) =
            target.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())
        {
            eprintln!("Failed to listen for `{event_type}`: {error:?}");
        }
        DomSubscription::Listener {
            target,
            event_type,
            closure,
        }
    }

    fn on_text_mutation(&self, mut handler: Box<dyn FnMut()>) -> Self::Subscription {
        let closure = Closure::<dyn FnMut()>::new(move || handler());
        let init = MutationObserverInit::new();
        init.set_character_data(true);
        init.set_subtree(true);
        init.set_child_list(false);
        init.set_attributes(false);
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())
            .and_then(|observer| {
                observer.observe_with_options(&self.0, &init)?;
                Ok(observer)
            })
            .map_err(|error| eprintln!("Failed to observe text mutations: {error:?}"))
            .ok();
        DomSubscription::Observer {
            observer,
            _closure: closure,
        }
    }
}

/// Binds `element` to `localStorage`.
pub fn attach(element: &Element, options: impl Into<SyncOptions>) -> Option<SyncHandle<DomElement>> {
    attach_to_area(element, StoreArea::Local, options.into())
}

fn attach_to_area(
    element: &Element,
    area: StoreArea,
    options: SyncOptions,
) -> Option<SyncHandle<DomElement>> {
    match WebStorage::open(area) {
        Ok(storage) => SyncEngine::new(storage).attach(&DomElement::new(element.clone()), options),
        Err(error) => {
            eprintln!("[local-storage-sync] {error}, not syncing '{}'", options.name());
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionParams {
    Key(String),
    Full {
        name: String,
        #[serde(default, rename = "initValue", alias = "init_value")]
        init_value: Option<String>,
        #[serde(default)]
        storage: StoreArea,
    },
}

impl ActionParams {
    fn parse(params: JsValue) -> Option<(StoreArea, SyncOptions)> {
        match serde_wasm_bindgen::from_value(params) {
            Ok(Self::Key(name)) => Some((StoreArea::Local, SyncOptions::new(name))),
            Ok(Self::Full {
                name,
                init_value,
                storage,
            }) => {
                let options = SyncOptions::new(name);
                let options = match init_value {
                    Some(init_value) => options.with_init_value(init_value),
                    None => options,
                };
                Some((storage, options))
            }
            Err(error) => {
                eprintln!("[local-storage-sync] invalid parameters: {error}");
                None
            }
        }
    }
}

/// What the host's action system keeps for one attached node.
///
/// Attaching dispatches synthetic `input`/`change` events, and host listeners
/// may call back into `destroy` or `update` while that happens. No borrow of
/// the handle slot is held across an attach for that reason.
#[wasm_bindgen]
pub struct ActionReturn {
    element: Element,
    area: Cell<StoreArea>,
    destroyed: Cell<bool>,
    handle: RefCell<Option<SyncHandle<DomElement>>>,
}

#[wasm_bindgen]
impl ActionReturn {
    pub fn destroy(&self) {
        self.destroyed.set(true);
        if let Ok(mut slot) = self.handle.try_borrow_mut() {
            if let Some(handle) = slot.as_mut() {
                handle.destroy();
            }
        }
    }

    pub fn update(&self, params: JsValue) {
        let Some((area, options)) = ActionParams::parse(params) else {
            return;
        };
        self.destroyed.set(false);
        let current = self.handle.borrow_mut().take();
        let mut next = match current {
            Some(mut handle) if self.area.get() == area => {
                handle.update(options);
                Some(handle)
            }
            previous => {
                drop(previous);
                attach_to_area(&self.element, area, options)
            }
        };
        self.area.set(area);
        // `destroy` ran from a listener while the element was being re-seeded.
        if self.destroyed.get() {
            if let Some(handle) = next.as_mut() {
                handle.destroy();
            }
        }
        *self.handle.borrow_mut() = next;
    }

    /// Whether a watcher is currently installed.
    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.handle
            .try_borrow()
            .map(|slot| slot.as_ref().is_some_and(SyncHandle::is_active))
            .unwrap_or(false)
    }
}

/// Action entry point: `use:useLocalStorage={"key"}` or
/// `use:useLocalStorage={{ name, initValue, storage: "session" }}`.
#[wasm_bindgen(js_name = useLocalStorage)]
pub fn use_local_storage(node: Element, params: JsValue) -> Option<ActionReturn> {
    let (area, options) = ActionParams::parse(params)?;
    let handle = attach_to_area(&node, area, options)?;
    Some(ActionReturn {
        element: node,
        area: Cell::new(area),
        destroyed: Cell::new(false),
        handle: RefCell::new(Some(handle)),
    })
}
