//! [`Dom`] over the live browser document

use liveedit_agent::dom::css_property_name;
use liveedit_agent::{Dom, DocumentListener, DomError, DomResult, ElementListener, NodeKey};
use liveedit_protocol::{Rect, IDENTITY_ATTR};
use std::cell::Cell;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Document, Element, HtmlElement, Node, Window};

pub struct WebDom {
    window: Window,
    document: Document,
    keys: js_sys::WeakMap,
    next_key: Cell<u64>,
    document_handler: Option<js_sys::Function>,
    element_handler: Option<js_sys::Function>,
}

impl WebDom {
    pub fn new(window: Window) -> DomResult<Self> {
        let document = window
            .document()
            .ok_or_else(|| DomError::Operation("window has no document".to_string()))?;
        Ok(Self {
            window,
            document,
            keys: js_sys::WeakMap::new(),
            next_key: Cell::new(1),
            document_handler: None,
            element_handler: None,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// JS functions registered for document-level and edit-element events.
    pub fn set_handlers(&mut self, document: js_sys::Function, element: js_sys::Function) {
        self.document_handler = Some(document);
        self.element_handler = Some(element);
    }

    fn body(&self) -> Option<HtmlElement> {
        self.document.body()
    }

    fn handler(handler: &Option<js_sys::Function>) -> DomResult<&js_sys::Function> {
        handler
            .as_ref()
            .ok_or_else(|| DomError::Operation("no event handler installed".to_string()))
    }
}

pub(crate) fn js_error(value: JsValue) -> DomError {
    let message = value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value));
    DomError::Operation(message)
}

impl Dom for WebDom {
    type Node = Element;

    fn node_key(&self, node: &Element) -> NodeKey {
        let object: &js_sys::Object = node.as_ref();
        if let Some(key) = self.keys.get(object).as_f64() {
            return NodeKey(key as u64);
        }
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.keys.set(object, &JsValue::from_f64(key as f64));
        NodeKey(key)
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn parent_element(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn is_document_root(&self, node: &Element) -> bool {
        let is_body = self
            .body()
            .is_some_and(|body| AsRef::<Element>::as_ref(&body) == node);
        is_body || self.document.document_element().as_ref() == Some(node)
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn identified_elements(&self) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(&format!("[{}]", IDENTITY_ATTR)) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) -> DomResult<()> {
        node.set_attribute(name, value).map_err(js_error)
    }

    fn remove_attribute(&mut self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn rendered_text(&self, node: &Element) -> String {
        match node.dyn_ref::<HtmlElement>() {
            Some(html) => html.inner_text(),
            None => self.text_content(node),
        }
    }

    fn child_texts(&self, node: &Element) -> Vec<String> {
        let children = node.child_nodes();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|child| child.node_type() == Node::TEXT_NODE)
            .map(|child| child.text_content().unwrap_or_default())
            .collect()
    }

    fn computed_style(&self, node: &Element, property: &str) -> Option<String> {
        let style = self.window.get_computed_style(node).ok()??;
        style.get_property_value(&css_property_name(property)).ok()
    }

    fn set_style_property(&mut self, node: &Element, property: &str, value: &str) -> DomResult<()> {
        let html = node
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| DomError::Operation("element has no inline style".to_string()))?;
        html.style()
            .set_property(&css_property_name(property), value)
            .map_err(js_error)
    }

    fn add_class(&mut self, node: &Element, class: &str) -> DomResult<()> {
        node.class_list().add_1(class).map_err(js_error)
    }

    fn remove_class(&mut self, node: &Element, class: &str) -> DomResult<()> {
        node.class_list().remove_1(class).map_err(js_error)
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect::new(rect.x(), rect.y(), rect.width(), rect.height())
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or_default()
    }

    fn remove_element(&mut self, node: &Element) -> bool {
        if node.parent_node().is_none() {
            return false;
        }
        node.remove();
        true
    }

    fn focus(&mut self, node: &Element) -> DomResult<()> {
        let html = node
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| DomError::Operation("element is not focusable".to_string()))?;
        html.focus().map_err(js_error)
    }

    fn inject_stylesheet(&mut self, id: &str, css: &str) -> DomResult<()> {
        let head = self
            .document
            .head()
            .ok_or_else(|| DomError::Operation("document has no head".to_string()))?;
        let style = self.document.create_element("style").map_err(js_error)?;
        style.set_id(id);
        style.set_text_content(Some(css));
        head.append_child(&style).map_err(js_error)?;
        Ok(())
    }

    fn remove_stylesheet(&mut self, id: &str) {
        while let Some(element) = self.document.get_element_by_id(id) {
            element.remove();
        }
    }

    fn set_body_cursor(&mut self, cursor: Option<&str>) {
        let Some(body) = self.body() else {
            return;
        };
        let style = body.style();
        let _ = match cursor {
            Some(cursor) => style.set_property("cursor", cursor),
            None => style.remove_property("cursor").map(|_| ()),
        };
    }

    fn set_body_attribute(&mut self, name: &str, value: Option<&str>) {
        let Some(body) = self.body() else {
            return;
        };
        let _ = match value {
            Some(value) => body.set_attribute(name, value),
            None => body.remove_attribute(name),
        };
    }

    fn location(&self) -> Option<String> {
        self.window.location().href().ok()
    }

    fn add_document_listener(&mut self, listener: DocumentListener) -> DomResult<()> {
        let handler = Self::handler(&self.document_handler)?;
        let options = AddEventListenerOptions::new();
        options.set_capture(true);
        self.document
            .add_event_listener_with_callback_and_add_event_listener_options(
                listener.event_type(),
                handler,
                &options,
            )
            .map_err(js_error)
    }

    fn remove_document_listener(&mut self, listener: DocumentListener) {
        if let Some(handler) = &self.document_handler {
            let _ = self.document.remove_event_listener_with_callback_and_bool(
                listener.event_type(),
                handler,
                true,
            );
        }
    }

    fn add_element_listener(&mut self, node: &Element, listener: ElementListener) -> DomResult<()> {
        let handler = Self::handler(&self.element_handler)?;
        node.add_event_listener_with_callback(listener.event_type(), handler)
            .map_err(js_error)
    }

    fn remove_element_listener(&mut self, node: &Element, listener: ElementListener) {
        if let Some(handler) = &self.element_handler {
            let _ = node.remove_event_listener_with_callback(listener.event_type(), handler);
        }
    }
}
