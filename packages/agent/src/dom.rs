//! # Document abstraction
//!
//! The agent never touches a browser API directly. Everything it needs from
//! the rendered document goes through [`Dom`], so the state machine runs the
//! same against `web-sys` in a page and against [`MemoryDom`](crate::MemoryDom)
//! in tests.
//!
//! Browser events come back in as [`DomEvent`]s; the agent answers each one
//! with an [`EventResponse`] telling the backend whether to cancel the
//! default action and/or stop propagation.

use crate::error::DomResult;
use liveedit_protocol::Rect;
use std::fmt;

/// Stable per-node key for side tables.
///
/// Keys are never reused for a different node, and holding one does not keep
/// the node alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Capture-phase listeners registered on the document while editing is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentListener {
    Click,
    Submit,
    KeyDown,
    PointerOver,
    Scroll,
}

impl DocumentListener {
    pub const ALL: [DocumentListener; 5] = [
        DocumentListener::Click,
        DocumentListener::Submit,
        DocumentListener::KeyDown,
        DocumentListener::PointerOver,
        DocumentListener::Scroll,
    ];

    pub fn event_type(self) -> &'static str {
        match self {
            DocumentListener::Click => "click",
            DocumentListener::Submit => "submit",
            DocumentListener::KeyDown => "keydown",
            DocumentListener::PointerOver => "pointerover",
            DocumentListener::Scroll => "scroll",
        }
    }
}

/// Listeners attached to the element under inline edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementListener {
    Input,
    Blur,
    KeyDown,
}

impl ElementListener {
    pub const ALL: [ElementListener; 3] = [
        ElementListener::Input,
        ElementListener::Blur,
        ElementListener::KeyDown,
    ];

    pub fn event_type(self) -> &'static str {
        match self {
            ElementListener::Input => "input",
            ElementListener::Blur => "blur",
            ElementListener::KeyDown => "keydown",
        }
    }
}

/// A browser event delivered to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent<N> {
    Click { target: N },
    Submit { target: N },
    KeyDown { key: String },
    PointerOver { target: N },
    Scroll,
    /// Content of the inline-edit element changed
    Input { element: N },
    /// The inline-edit element lost focus
    Blur { element: N },
    /// Key pressed inside the inline-edit element
    EditKeyDown { element: N, key: String },
}

/// What the backend should do with the event after the agent saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl EventResponse {
    pub const PASS: EventResponse = EventResponse {
        prevent_default: false,
        stop_propagation: false,
    };

    pub const PREVENT: EventResponse = EventResponse {
        prevent_default: true,
        stop_propagation: false,
    };

    pub const BLOCK: EventResponse = EventResponse {
        prevent_default: true,
        stop_propagation: true,
    };
}

pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    fn node_key(&self, node: &Self::Node) -> NodeKey;
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;
    /// `body` and above: ancestor walks stop here
    fn is_document_root(&self, node: &Self::Node) -> bool;
    /// Lower-case tag name
    fn tag_name(&self, node: &Self::Node) -> String;
    /// Every element carrying an identity attribute, in document order
    fn identified_elements(&self) -> Vec<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> DomResult<()>;
    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Raw text of all descendants (`textContent`)
    fn text_content(&self, node: &Self::Node) -> String;
    fn set_text_content(&mut self, node: &Self::Node, text: &str);
    /// Layout-aware text (`innerText`)
    fn rendered_text(&self, node: &Self::Node) -> String;
    /// Values of the direct child text nodes
    fn child_texts(&self, node: &Self::Node) -> Vec<String>;

    /// Computed value of a camelCase CSS property
    fn computed_style(&self, node: &Self::Node, property: &str) -> Option<String>;
    /// Set an inline style from a camelCase or custom property name
    fn set_style_property(&mut self, node: &Self::Node, property: &str, value: &str)
        -> DomResult<()>;
    fn add_class(&mut self, node: &Self::Node, class: &str) -> DomResult<()>;
    fn remove_class(&mut self, node: &Self::Node, class: &str) -> DomResult<()>;

    fn bounding_rect(&self, node: &Self::Node) -> Rect;
    fn viewport_width(&self) -> f64;

    /// Detach the element from its parent. Returns false if it had none.
    fn remove_element(&mut self, node: &Self::Node) -> bool;
    fn focus(&mut self, node: &Self::Node) -> DomResult<()>;

    fn inject_stylesheet(&mut self, id: &str, css: &str) -> DomResult<()>;
    fn remove_stylesheet(&mut self, id: &str);
    fn set_body_cursor(&mut self, cursor: Option<&str>);
    fn set_body_attribute(&mut self, name: &str, value: Option<&str>);
    fn location(&self) -> Option<String>;

    fn add_document_listener(&mut self, listener: DocumentListener) -> DomResult<()>;
    fn remove_document_listener(&mut self, listener: DocumentListener);
    fn add_element_listener(&mut self, node: &Self::Node, listener: ElementListener)
        -> DomResult<()>;
    fn remove_element_listener(&mut self, node: &Self::Node, listener: ElementListener);
}

/// `fontSize` → `font-size`. Custom properties and already-kebab names pass through.
pub fn css_property_name(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut name = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}
