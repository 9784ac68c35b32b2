//! In-memory document used by headless hosts and tests.
//!
//! Models just enough of a browser document for the agent: an element tree
//! under `body`, attributes, inline styles (serialized through the `style`
//! attribute), inherited `white-space`, layout boxes, focus, injected
//! stylesheets and listener registrations.

use crate::classify::preserves_white_space;
use crate::dom::{css_property_name, Dom, DocumentListener, ElementListener, NodeKey};
use crate::error::{DomError, DomResult};
use liveedit_protocol::{Rect, IDENTITY_ATTR};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

#[derive(Debug, Clone)]
enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    tag: String,
    attributes: BTreeMap<String, String>,
    /// Inline declarations, kebab-case, in declaration order
    styles: Vec<(String, String)>,
    /// Computed values that do not come from inline styles
    computed: BTreeMap<String, String>,
    rect: Rect,
}

#[derive(Debug, Clone)]
struct MemoryNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct MemoryDom {
    nodes: Vec<MemoryNode>,
    body: NodeId,
    stylesheets: Vec<(String, String)>,
    body_cursor: Option<String>,
    document_listeners: BTreeMap<DocumentListener, usize>,
    element_listeners: HashMap<NodeId, BTreeMap<ElementListener, usize>>,
    focused: Option<NodeId>,
    viewport_width: f64,
    location: Option<String>,
    content_mutations: usize,
}

impl MemoryDom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            body: NodeId(0),
            stylesheets: Vec::new(),
            body_cursor: None,
            document_listeners: BTreeMap::new(),
            element_listeners: HashMap::new(),
            focused: None,
            viewport_width: 1280.0,
            location: None,
            content_mutations: 0,
        };
        dom.body = dom.create_element("body");
        dom
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..ElementData::default()
        }))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let element = self.create_element(tag);
        self.append_child(parent, element);
        element
    }

    /// Append an element carrying an identity attribute.
    pub fn append_identified(&mut self, parent: NodeId, tag: &str, identity: &str) -> NodeId {
        let element = self.append_element(parent, tag);
        if let Some(data) = self.element_mut(element) {
            data.attributes
                .insert(IDENTITY_ATTR.to_string(), identity.to_string());
        }
        element
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.push(NodeData::Text(text.to_string()));
        self.append_child(parent, node);
        node
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(element) = self.element_mut(node) {
            element.rect = rect;
        }
    }

    /// Pretend the page's stylesheets computed `value` for `property`.
    pub fn set_computed_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element
                .computed
                .insert(css_property_name(property), value.to_string());
        }
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    pub fn set_location(&mut self, url: impl Into<String>) {
        self.location = Some(url.into());
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    pub fn stylesheet(&self, id: &str) -> Option<&str> {
        self.stylesheets
            .iter()
            .find(|(sheet_id, _)| sheet_id == id)
            .map(|(_, css)| css.as_str())
    }

    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    pub fn document_listener_count(&self, listener: DocumentListener) -> usize {
        self.document_listeners.get(&listener).copied().unwrap_or(0)
    }

    pub fn total_document_listeners(&self) -> usize {
        self.document_listeners.values().sum()
    }

    pub fn element_listener_count(&self, node: NodeId, listener: ElementListener) -> usize {
        self.element_listeners
            .get(&node)
            .and_then(|listeners| listeners.get(&listener))
            .copied()
            .unwrap_or(0)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn body_cursor(&self) -> Option<&str> {
        self.body_cursor.as_deref()
    }

    /// Text, style, class and structure changes made through [`Dom`].
    pub fn content_mutations(&self) -> usize {
        self.content_mutations
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(MemoryNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &MemoryNode {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut MemoryNode {
        &mut self.nodes[id.0 as usize]
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node(node).parent else {
            return false;
        };
        self.node_mut(parent).children.retain(|child| *child != node);
        self.node_mut(node).parent = None;
        true
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.node(node).data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(_) => {
                for child in &self.node(node).children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    fn collect_identified(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if let Some(element) = self.element(node) {
            if element.attributes.contains_key(IDENTITY_ATTR) {
                out.push(node);
            }
            for child in &self.node(node).children {
                self.collect_identified(*child, out);
            }
        }
    }

    fn inline_style(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?
            .styles
            .iter()
            .find(|(property, _)| property == name)
            .map(|(_, value)| value.clone())
    }

    fn white_space(&self, node: NodeId) -> String {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(value) = self.inline_style(id, "white-space") {
                return value;
            }
            if let Some(element) = self.element(id) {
                if let Some(value) = element.computed.get("white-space") {
                    return value.clone();
                }
                match element.tag.as_str() {
                    "pre" => return "pre".to_string(),
                    "textarea" => return "pre-wrap".to_string(),
                    _ => {}
                }
            }
            current = self.node(id).parent;
        }
        "normal".to_string()
    }

    fn serialize_styles(styles: &[(String, String)]) -> String {
        styles
            .iter()
            .map(|(property, value)| format!("{}: {};", property, value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn parse_styles(text: &str) -> Vec<(String, String)> {
        text.split(';')
            .filter_map(|declaration| {
                let (property, value) = declaration.split_once(':')?;
                let property = property.trim();
                let value = value.trim();
                (!property.is_empty()).then(|| (property.to_string(), value.to_string()))
            })
            .collect()
    }

    fn class_list(&self, node: NodeId) -> Vec<String> {
        self.element(node)
            .and_then(|element| element.attributes.get("class"))
            .map(|classes| classes.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn set_class_list(&mut self, node: NodeId, classes: Vec<String>) {
        if let Some(element) = self.element_mut(node) {
            element
                .attributes
                .insert("class".to_string(), classes.join(" "));
            self.content_mutations += 1;
        }
    }

    fn ensure_element(&self, node: NodeId) -> DomResult<()> {
        match self.element(node) {
            Some(_) => Ok(()),
            None => Err(not_an_element(node)),
        }
    }

    fn element_or_err(&mut self, node: NodeId) -> DomResult<&mut ElementData> {
        self.element_mut(node).ok_or_else(|| not_an_element(node))
    }
}

fn not_an_element(node: NodeId) -> DomError {
    DomError::Operation(format!("{:?} is not an element", node))
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn node_key(&self, node: &NodeId) -> NodeKey {
        NodeKey(node.0 as u64)
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let mut current = Some(*node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).parent
    }

    fn is_document_root(&self, node: &NodeId) -> bool {
        *node == self.body
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.element(*node)
            .map(|element| element.tag.clone())
            .unwrap_or_default()
    }

    fn identified_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_identified(self.body, &mut out);
        out
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let element = self.element(*node)?;
        if name == "style" {
            if element.styles.is_empty() {
                return element.attributes.get("style").cloned();
            }
            return Some(Self::serialize_styles(&element.styles));
        }
        element.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> DomResult<()> {
        let element = self.element_or_err(*node)?;
        if name == "style" {
            element.styles = Self::parse_styles(value);
            element.attributes.insert("style".to_string(), value.to_string());
            self.content_mutations += 1;
            return Ok(());
        }
        element.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        let Some(element) = self.element_mut(*node) else {
            return;
        };
        if name == "style" {
            element.styles.clear();
        }
        element.attributes.remove(name);
    }

    fn text_content(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.collect_text(*node, &mut out);
        out
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) {
        let children = std::mem::take(&mut self.node_mut(*node).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        if !text.is_empty() {
            self.append_text(*node, text);
        }
        self.content_mutations += 1;
    }

    fn rendered_text(&self, node: &NodeId) -> String {
        let text = self.text_content(node);
        if preserves_white_space(&self.white_space(*node)) {
            return text;
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn child_texts(&self, node: &NodeId) -> Vec<String> {
        self.node(*node)
            .children
            .iter()
            .filter_map(|child| match &self.node(*child).data {
                NodeData::Text(text) => Some(text.clone()),
                NodeData::Element(_) => None,
            })
            .collect()
    }

    fn computed_style(&self, node: &NodeId, property: &str) -> Option<String> {
        let name = css_property_name(property);
        if name == "white-space" {
            return Some(self.white_space(*node));
        }
        if let Some(value) = self.inline_style(*node, &name) {
            return Some(value);
        }
        self.element(*node)?.computed.get(&name).cloned()
    }

    fn set_style_property(&mut self, node: &NodeId, property: &str, value: &str) -> DomResult<()> {
        let name = css_property_name(property);
        let element = self.element_or_err(*node)?;
        match element.styles.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => element.styles.push((name, value.to_string())),
        }
        self.content_mutations += 1;
        Ok(())
    }

    fn add_class(&mut self, node: &NodeId, class: &str) -> DomResult<()> {
        self.ensure_element(*node)?;
        let mut classes = self.class_list(*node);
        if !classes.iter().any(|existing| existing == class) {
            classes.push(class.to_string());
            self.set_class_list(*node, classes);
        }
        Ok(())
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) -> DomResult<()> {
        self.ensure_element(*node)?;
        let mut classes = self.class_list(*node);
        let before = classes.len();
        classes.retain(|existing| existing != class);
        if classes.len() != before {
            self.set_class_list(*node, classes);
        }
        Ok(())
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        self.element(*node)
            .map(|element| element.rect)
            .unwrap_or_default()
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn remove_element(&mut self, node: &NodeId) -> bool {
        if !self.detach(*node) {
            return false;
        }
        if let Some(focused) = self.focused {
            if !self.is_connected(&focused) {
                self.focused = None;
            }
        }
        self.content_mutations += 1;
        true
    }

    fn focus(&mut self, node: &NodeId) -> DomResult<()> {
        if !self.is_connected(node) {
            return Err(DomError::Detached);
        }
        self.focused = Some(*node);
        Ok(())
    }

    fn inject_stylesheet(&mut self, id: &str, css: &str) -> DomResult<()> {
        self.stylesheets.push((id.to_string(), css.to_string()));
        Ok(())
    }

    fn remove_stylesheet(&mut self, id: &str) {
        self.stylesheets.retain(|(sheet_id, _)| sheet_id != id);
    }

    fn set_body_cursor(&mut self, cursor: Option<&str>) {
        self.body_cursor = cursor.map(str::to_string);
    }

    fn set_body_attribute(&mut self, name: &str, value: Option<&str>) {
        let body = self.body;
        let Some(element) = self.element_mut(body) else {
            return;
        };
        let attributes = &mut element.attributes;
        match value {
            Some(value) => {
                attributes.insert(name.to_string(), value.to_string());
            }
            None => {
                attributes.remove(name);
            }
        }
    }

    fn location(&self) -> Option<String> {
        self.location.clone()
    }

    fn add_document_listener(&mut self, listener: DocumentListener) -> DomResult<()> {
        *self.document_listeners.entry(listener).or_insert(0) += 1;
        Ok(())
    }

    fn remove_document_listener(&mut self, listener: DocumentListener) {
        if let Some(count) = self.document_listeners.get_mut(&listener) {
            *count -= 1;
            if *count == 0 {
                self.document_listeners.remove(&listener);
            }
        }
    }

    fn add_element_listener(&mut self, node: &NodeId, listener: ElementListener) -> DomResult<()> {
        self.ensure_element(*node)?;
        *self
            .element_listeners
            .entry(*node)
            .or_default()
            .entry(listener)
            .or_insert(0) += 1;
        Ok(())
    }

    fn remove_element_listener(&mut self, node: &NodeId, listener: ElementListener) {
        if let Some(listeners) = self.element_listeners.get_mut(node) {
            if let Some(count) = listeners.get_mut(&listener) {
                *count -= 1;
                if *count == 0 {
                    listeners.remove(&listener);
                }
            }
            if listeners.is_empty() {
                self.element_listeners.remove(node);
            }
        }
    }
}
