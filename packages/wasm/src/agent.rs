//! Browser wiring for the editor agent
//!
//! The agent lives in `Rc<RefCell<_>>` shared by the JS callbacks: one for
//! document-level capture listeners, one for the element under inline edit,
//! one for window messages and a `MutationObserver` that reports client-side
//! rendering. Callbacks hold only a `Weak`, so dropping the
//! [`AgentHandle`] tears everything down.

use crate::channel::{is_parent, PostMessageChannel};
use crate::dom::WebDom;
use liveedit_agent::{AgentConfig, DomEvent, EditorAgent, EventResponse};
use liveedit_protocol::EditMode;
use serde::Deserialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, Event, KeyboardEvent, MessageEvent, MutationObserver, MutationObserverInit, Node,
    Window,
};

type WebAgent = EditorAgent<WebDom, PostMessageChannel>;
type Callback = Closure<dyn FnMut(Event)>;
type MutationCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

/// Options accepted by `startAgent`
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    #[serde(flatten)]
    pub agent: AgentConfig,

    /// `postMessage` target origin for outbound events
    #[serde(default)]
    pub target_origin: Option<String>,

    /// Console log level (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default)]
    pub log_level: Option<String>,
}

#[wasm_bindgen]
pub struct AgentHandle {
    agent: Rc<RefCell<WebAgent>>,
    window: Window,
    _document_events: Callback,
    _element_events: Callback,
    messages: Callback,
    content_loaded: Callback,
    observer: MutationObserver,
    _mutations: MutationCallback,
}

#[wasm_bindgen]
impl AgentHandle {
    /// Current mode: `disabled`, `enabled` or `saving`.
    ///
    /// `undefined` while the agent is busy handling an event.
    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> Option<String> {
        self.agent
            .try_borrow()
            .ok()
            .map(|agent| agent.mode().as_str().to_string())
    }

    /// Whether `READY` has been sent to the host
    #[wasm_bindgen(getter)]
    pub fn ready(&self) -> bool {
        self.agent
            .try_borrow()
            .map(|agent| agent.state().ready_sent)
            .unwrap_or(false)
    }

    /// Tell the agent the page rendered new content.
    #[wasm_bindgen(js_name = notifyContentChanged)]
    pub fn notify_content_changed(&self) {
        if let Ok(mut agent) = self.agent.try_borrow_mut() {
            agent.notify_content_changed();
        }
    }
}

impl Drop for AgentHandle {
    fn drop(&mut self) {
        self.observer.disconnect();
        let _ = self.window.remove_event_listener_with_callback(
            "message",
            self.messages.as_ref().unchecked_ref(),
        );
        if let Some(document) = self.window.document() {
            let _ = document.remove_event_listener_with_callback(
                "DOMContentLoaded",
                self.content_loaded.as_ref().unchecked_ref(),
            );
        }
        if let Ok(mut agent) = self.agent.try_borrow_mut() {
            agent.set_mode(EditMode::Disabled);
        }
    }
}

type AgentSlot = Rc<RefCell<Weak<RefCell<WebAgent>>>>;

pub fn start(options: StartOptions) -> Result<AgentHandle, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let mut dom = WebDom::new(window.clone()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let channel = PostMessageChannel::new(
        window.clone(),
        options.target_origin.clone().unwrap_or_else(|| "*".to_string()),
    );

    // The DOM needs its handlers before the agent exists; they reach it through the slot.
    let slot = AgentSlot::default();
    let document_events = listener(&slot, document_event);
    let element_events = listener(&slot, element_event);
    dom.set_handlers(
        document_events.as_ref().unchecked_ref::<js_sys::Function>().clone(),
        element_events.as_ref().unchecked_ref::<js_sys::Function>().clone(),
    );

    let agent = Rc::new(RefCell::new(EditorAgent::new(dom, channel, options.agent)));
    *slot.borrow_mut() = Rc::downgrade(&agent);
    finish(window, agent, document_events, element_events)
}

fn listener(slot: &AgentSlot, convert: fn(&Event) -> Option<DomEvent<Element>>) -> Callback {
    let slot = slot.clone();
    Callback::new(move |event: Event| {
        let agent = slot.borrow().clone();
        dispatch(&agent, &event, convert(&event));
    })
}

fn finish(
    window: Window,
    agent: Rc<RefCell<WebAgent>>,
    document_events: Callback,
    element_events: Callback,
) -> Result<AgentHandle, JsValue> {
    let weak = Rc::downgrade(&agent);
    let messages = Callback::new({
        let window = window.clone();
        move |event: Event| {
            let Some(message) = event.dyn_ref::<MessageEvent>() else {
                return;
            };
            let Some(agent) = weak.upgrade() else {
                return;
            };
            let from_parent = is_parent(&window, message.source());
            let data: Value = match serde_wasm_bindgen::from_value(message.data()) {
                Ok(data) => data,
                // Not JSON-shaped, so not ours
                Err(_) => return,
            };
            match agent.try_borrow_mut() {
                Ok(mut agent) => {
                    agent.receive(data, from_parent);
                }
                Err(_) => debug!("Dropped re-entrant message"),
            };
        }
    });
    window.add_event_listener_with_callback("message", messages.as_ref().unchecked_ref())?;

    let weak = Rc::downgrade(&agent);
    let content_loaded = Callback::new(move |_event: Event| {
        if let Some(agent) = weak.upgrade() {
            if let Ok(mut agent) = agent.try_borrow_mut() {
                agent.start();
            }
        }
    });

    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let (observer, mutations) = observe_content(&document, &agent)?;
    if document.ready_state() == "loading" {
        document.add_event_listener_with_callback(
            "DOMContentLoaded",
            content_loaded.as_ref().unchecked_ref(),
        )?;
    } else {
        agent.borrow_mut().start();
    }

    Ok(AgentHandle {
        agent,
        window,
        _document_events: document_events,
        _element_events: element_events,
        messages,
        content_loaded,
        observer,
        _mutations: mutations,
    })
}

/// Client-side rendering adds identified elements long after load; tell the
/// agent whenever the tree changes.
fn observe_content(
    document: &web_sys::Document,
    agent: &Rc<RefCell<WebAgent>>,
) -> Result<(MutationObserver, MutationCallback), JsValue> {
    let weak = Rc::downgrade(agent);
    let mutations = MutationCallback::new(move |_records: js_sys::Array, _observer: MutationObserver| {
        let Some(agent) = weak.upgrade() else {
            return;
        };
        match agent.try_borrow_mut() {
            Ok(mut agent) => agent.notify_content_changed(),
            Err(_) => debug!("Dropped re-entrant content change"),
        };
    });

    let observer = MutationObserver::new(mutations.as_ref().unchecked_ref())?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer.observe_with_options(document, &options)?;

    Ok((observer, mutations))
}

fn dispatch(agent: &Weak<RefCell<WebAgent>>, event: &Event, dom_event: Option<DomEvent<Element>>) {
    let Some(dom_event) = dom_event else {
        return;
    };
    let Some(agent) = agent.upgrade() else {
        return;
    };
    // Agent work (focus, text restore) can raise events synchronously.
    let response = match agent.try_borrow_mut() {
        Ok(mut agent) => agent.handle_event(dom_event),
        Err(_) => {
            debug!(event = %event.type_(), "Dropped re-entrant event");
            return;
        }
    };
    apply(event, response);
}

fn apply(event: &Event, response: EventResponse) {
    if response.prevent_default {
        event.prevent_default();
    }
    if response.stop_propagation {
        event.stop_propagation();
    }
}

/// The element an event was aimed at; text nodes resolve to their parent.
fn target_element(event: &Event) -> Option<Element> {
    let target = event.target()?;
    if let Some(element) = target.dyn_ref::<Element>() {
        return Some(element.clone());
    }
    target.dyn_ref::<Node>()?.parent_element()
}

fn current_element(event: &Event) -> Option<Element> {
    event.current_target()?.dyn_into::<Element>().ok()
}

fn key(event: &Event) -> Option<String> {
    event.dyn_ref::<KeyboardEvent>().map(|e| e.key())
}

fn document_event(event: &Event) -> Option<DomEvent<Element>> {
    match event.type_().as_str() {
        "click" => Some(DomEvent::Click {
            target: target_element(event)?,
        }),
        "submit" => Some(DomEvent::Submit {
            target: target_element(event)?,
        }),
        "keydown" => Some(DomEvent::KeyDown { key: key(event)? }),
        "pointerover" => Some(DomEvent::PointerOver {
            target: target_element(event)?,
        }),
        "scroll" => Some(DomEvent::Scroll),
        other => {
            warn!(event = other, "Unexpected document event");
            None
        }
    }
}

fn element_event(event: &Event) -> Option<DomEvent<Element>> {
    let element = current_element(event)?;
    match event.type_().as_str() {
        "input" => Some(DomEvent::Input { element }),
        "blur" => Some(DomEvent::Blur { element }),
        "keydown" => Some(DomEvent::EditKeyDown {
            element,
            key: key(event)?,
        }),
        other => {
            warn!(event = other, "Unexpected element event");
            None
        }
    }
}
