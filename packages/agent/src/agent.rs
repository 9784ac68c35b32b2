//! # Editor agent
//!
//! Owns the interaction state and reacts to two inputs: browser events
//! ([`EditorAgent::handle_event`]) and host commands
//! ([`EditorAgent::receive`]). Every reaction runs to completion inside the
//! call; nothing is queued or deferred.
//!
//! ## Modes
//!
//! ```text
//!            enable                 save
//! disabled ─────────▶ enabled ─────────────▶ saving
//!     ▲                  │   ◀───────────────   │
//!     │     disable      │        enable        │
//!     └──────────────────┴──────────────────────┘
//! ```
//!
//! Commands to the current mode, and `disabled → saving`, change nothing.

use crate::channel::{send, Channel};
use crate::classify::has_direct_text;
use crate::config::AgentConfig;
use crate::descriptor::build_descriptor;
use crate::dom::{Dom, DomEvent, DocumentListener, ElementListener, EventResponse};
use crate::metadata::MetadataCache;
use crate::overlay::{
    CONTENT_EDITABLE_ATTR, EDITING_ATTR, FULL_WIDTH_ATTR, HOVERED_ATTR, OVERLAY_CSS,
    OVERLAY_STYLE_ID, SAVING_ATTR, SCROLL_OVERRIDE_CSS, SCROLL_OVERRIDE_ID, SELECTED_ATTR,
};
use crate::session::InlineEditSession;
use crate::state::{AgentState, Selection};
use chrono::{SecondsFormat, Utc};
use liveedit_protocol::{
    ClassChanges, EditMode, Inbound, Outbound, ReadyPayload, TextUpdate, TrustPolicy,
    IDENTITY_ATTR,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, instrument, trace, warn};

/// What a host command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Valid command with nothing to do (same-mode transition and the like)
    Ignored,
    /// Mutation command arrived while nothing was selected
    NoSelection,
}

pub struct EditorAgent<D: Dom, C: Channel> {
    dom: D,
    channel: C,
    config: AgentConfig,
    trust: TrustPolicy,
    state: AgentState<D::Node>,
    cache: MetadataCache,
}

impl<D: Dom, C: Channel> EditorAgent<D, C> {
    pub fn new(dom: D, channel: C, config: AgentConfig) -> Self {
        let trust = TrustPolicy::new(config.host_tag.clone());
        Self {
            dom,
            channel,
            config,
            trust,
            state: AgentState::new(),
            cache: MetadataCache::new(),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state(&self) -> &AgentState<D::Node> {
        &self.state
    }

    pub fn mode(&self) -> EditMode {
        self.state.mode
    }

    /// Announce the agent once the page has identified elements.
    pub fn start(&mut self) {
        self.notify_content_changed();
    }

    /// The page's element tree changed (initial load, hydration, hot reload).
    pub fn notify_content_changed(&mut self) {
        self.cache.prune(&self.dom);

        if let Some(hover) = self.state.hover.clone() {
            if !self.dom.is_connected(&hover) {
                self.state.hover = None;
            }
        }

        if self.state.ready_sent {
            return;
        }

        let count = self.dom.identified_elements().len();
        if count == 0 {
            trace!("No identified elements yet");
            return;
        }

        self.state.ready_sent = true;
        debug!(count, "Agent ready");
        self.emit(Outbound::Ready(ReadyPayload {
            count,
            url: self.dom.location(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }));
    }

    /// Inbound channel data. Untrusted traffic is dropped without a trace.
    pub fn receive(&mut self, data: Value, from_parent: bool) -> Option<CommandOutcome> {
        match self.trust.admit(data, from_parent) {
            Ok(command) => Some(self.handle_command(command)),
            Err(e) if e.is_silent() => {
                trace!(reason = %e, "Dropped inbound message");
                None
            }
            Err(e) => {
                warn!(error = %e, "Ignoring inbound message");
                None
            }
        }
    }

    #[instrument(skip(self, command), fields(kind = command.kind()))]
    pub fn handle_command(&mut self, command: Inbound) -> CommandOutcome {
        match command {
            Inbound::SetState(mode) => {
                if self.set_mode(mode) {
                    CommandOutcome::Applied
                } else {
                    CommandOutcome::Ignored
                }
            }
            Inbound::UpdateText(text) => self.update_text(&text),
            Inbound::UpdateStyles(styles) => self.update_styles(&styles),
            Inbound::UpdateClasses(changes) => self.update_classes(&changes),
            Inbound::DeleteElement => self.delete_selected(),
            Inbound::ClearSelection => {
                self.end_inline_edit(false);
                self.release_selection();
                self.emit(Outbound::SelectionCleared);
                CommandOutcome::Applied
            }
        }
    }

    /// Apply a mode transition. Returns false when nothing changed.
    pub fn set_mode(&mut self, target: EditMode) -> bool {
        let from = self.state.mode;
        if from == target {
            trace!(mode = %from, "Mode unchanged");
            return false;
        }

        match (from, target) {
            (EditMode::Disabled, EditMode::Enabled) => self.enable(),
            (EditMode::Enabled, EditMode::Saving) => self.enter_saving(),
            (EditMode::Saving, EditMode::Enabled) => self.leave_saving(),
            (EditMode::Enabled | EditMode::Saving, EditMode::Disabled) => self.disable(),
            _ => {
                debug!(from = %from, to = %target, "Ignored mode transition");
                return false;
            }
        }

        debug!(from = %from, to = %target, "Mode changed");
        true
    }

    fn enable(&mut self) {
        self.inject_stylesheet(OVERLAY_STYLE_ID, OVERLAY_CSS);
        self.listen();
        self.dom.set_body_cursor(Some(&self.config.cursor));
        self.dom.set_body_attribute(SAVING_ATTR, None);
        self.inject_stylesheet(SCROLL_OVERRIDE_ID, SCROLL_OVERRIDE_CSS);

        self.state.mode = EditMode::Enabled;
        self.emit(Outbound::ModeChanged(EditMode::Enabled));
    }

    fn enter_saving(&mut self) {
        self.dom.set_body_attribute(SAVING_ATTR, Some("true"));
        self.end_inline_edit(false);
        self.release_selection();
        self.clear_hover(false);
        self.state.mode = EditMode::Saving;
    }

    fn leave_saving(&mut self) {
        self.dom.set_body_attribute(SAVING_ATTR, None);
        self.state.mode = EditMode::Enabled;
        self.emit(Outbound::ModeChanged(EditMode::Enabled));
    }

    fn disable(&mut self) {
        self.end_inline_edit(false);
        self.unlisten();
        self.dom.set_body_cursor(None);
        self.dom.set_body_attribute(SAVING_ATTR, None);
        self.release_selection();
        self.clear_hover(false);
        self.dom.remove_stylesheet(OVERLAY_STYLE_ID);
        self.dom.remove_stylesheet(SCROLL_OVERRIDE_ID);

        self.state.mode = EditMode::Disabled;
        self.emit(Outbound::ModeChanged(EditMode::Disabled));
    }

    fn inject_stylesheet(&mut self, id: &str, css: &str) {
        self.dom.remove_stylesheet(id);
        if let Err(e) = self.dom.inject_stylesheet(id, css) {
            warn!(id, error = %e, "Failed to inject stylesheet");
        }
    }

    fn listen(&mut self) {
        if self.state.listening {
            return;
        }
        for listener in DocumentListener::ALL {
            if let Err(e) = self.dom.add_document_listener(listener) {
                warn!(event = listener.event_type(), error = %e, "Failed to add listener");
            }
        }
        self.state.listening = true;
    }

    fn unlisten(&mut self) {
        if !self.state.listening {
            return;
        }
        for listener in DocumentListener::ALL {
            self.dom.remove_document_listener(listener);
        }
        self.state.listening = false;
    }

    pub fn handle_event(&mut self, event: DomEvent<D::Node>) -> EventResponse {
        match event {
            DomEvent::Click { target } => self.on_click(target),
            DomEvent::Submit { target } => self.on_submit(target),
            DomEvent::KeyDown { key } => self.on_key_down(&key),
            DomEvent::PointerOver { target } => self.on_pointer_over(target),
            DomEvent::Scroll => {
                self.clear_hover(true);
                EventResponse::PASS
            }
            DomEvent::Input { element } => self.on_input(&element),
            DomEvent::Blur { element } => {
                if self.state.is_editing(&element) {
                    self.end_inline_edit(true);
                }
                EventResponse::PASS
            }
            DomEvent::EditKeyDown { element, key } => {
                if key == "Escape" && self.state.is_editing(&element) {
                    self.end_inline_edit(false);
                    return EventResponse::PREVENT;
                }
                EventResponse::PASS
            }
        }
    }

    fn on_click(&mut self, target: D::Node) -> EventResponse {
        if !self.state.mode.is_active() {
            return EventResponse::PASS;
        }

        // Caret placement inside the element being edited
        if let Some(editing) = self.state.editing().cloned() {
            if self.contains(&editing, &target) {
                return EventResponse::PASS;
            }
            self.end_inline_edit(true);
        }

        let Some(element) = self.find_identified(&target) else {
            self.release_selection();
            self.emit(Outbound::SelectionChanged(None));
            return EventResponse::BLOCK;
        };

        let editability = self.cache.get(&self.dom, &element).editability;
        if !editability.is_editable() {
            trace!("Clicked element is not editable");
            return EventResponse::BLOCK;
        }

        self.select(element.clone());
        let descriptor = build_descriptor(&self.dom, &mut self.cache, &element, true);
        self.emit(Outbound::SelectionChanged(Some(descriptor)));

        if editability.is_text_editable && has_direct_text(&self.dom, &element) {
            self.start_inline_edit(element);
        }

        EventResponse::BLOCK
    }

    fn on_submit(&mut self, target: D::Node) -> EventResponse {
        if !self.state.mode.is_active() {
            return EventResponse::PASS;
        }
        if self.find_identified(&target).is_some() {
            EventResponse::PREVENT
        } else {
            EventResponse::BLOCK
        }
    }

    fn on_key_down(&mut self, key: &str) -> EventResponse {
        if !self.state.mode.is_active() || key != "Escape" {
            return EventResponse::PASS;
        }
        // The session's own key handler ends the edit
        if self.state.session.is_some() {
            return EventResponse::PASS;
        }

        self.release_selection();
        self.clear_hover(true);
        self.emit(Outbound::SelectionCleared);
        EventResponse::PASS
    }

    fn on_pointer_over(&mut self, target: D::Node) -> EventResponse {
        if self.state.mode != EditMode::Enabled {
            return EventResponse::PASS;
        }

        let Some(element) = self.find_identified(&target) else {
            self.clear_hover(true);
            return EventResponse::PASS;
        };

        if self.state.hover.as_ref() == Some(&element) {
            return EventResponse::PASS;
        }

        let editable = self.cache.get(&self.dom, &element).editability.is_editable();
        if !editable || self.state.is_selected(&element) {
            self.clear_hover(true);
            return EventResponse::PASS;
        }

        self.clear_hover(false);
        self.mark_hovered(&element);
        self.state.hover = Some(element.clone());

        let descriptor = build_descriptor(&self.dom, &mut self.cache, &element, false);
        self.emit(Outbound::HoverChanged(Some(descriptor)));
        EventResponse::PASS
    }

    fn mark_hovered(&mut self, element: &D::Node) {
        let rect = self.dom.bounding_rect(element);
        let full_width =
            (self.dom.viewport_width() - rect.width).abs() <= self.config.full_width_tolerance;

        if let Err(e) = self.dom.set_attribute(element, HOVERED_ATTR, "true") {
            warn!(error = %e, "Failed to mark hovered element");
        }
        if full_width {
            if let Err(e) = self.dom.set_attribute(element, FULL_WIDTH_ATTR, "true") {
                warn!(error = %e, "Failed to mark full-width element");
            }
        } else {
            self.dom.remove_attribute(element, FULL_WIDTH_ATTR);
        }
    }

    /// Drop the hover affordance. `notify` reports the change to the host.
    fn clear_hover(&mut self, notify: bool) {
        let Some(hover) = self.state.hover.take() else {
            return;
        };
        self.dom.remove_attribute(&hover, HOVERED_ATTR);
        self.dom.remove_attribute(&hover, FULL_WIDTH_ATTR);
        if notify {
            self.emit(Outbound::HoverChanged(None));
        }
    }

    fn on_input(&mut self, element: &D::Node) -> EventResponse {
        let Some(session) = &self.state.session else {
            return EventResponse::PASS;
        };
        if session.element != *element {
            return EventResponse::PASS;
        }

        let update = TextUpdate {
            text: self.dom.text_content(element),
            metadata: session.identity.clone(),
        };
        self.emit(Outbound::TextUpdated(update));
        EventResponse::PASS
    }

    fn select(&mut self, element: D::Node) {
        self.release_selection();

        let original_style = self.dom.attribute(&element, "style");
        if let Err(e) = self.dom.set_attribute(&element, SELECTED_ATTR, "true") {
            warn!(error = %e, "Failed to mark selected element");
        }
        self.state.selection = Some(Selection {
            element,
            original_style,
        });
    }

    /// Unmark the selection and roll its inline style back. Emits nothing.
    fn release_selection(&mut self) {
        let Some(selection) = self.state.selection.take() else {
            return;
        };
        let element = &selection.element;
        self.dom.remove_attribute(element, SELECTED_ATTR);

        match &selection.original_style {
            Some(style) => {
                if let Err(e) = self.dom.set_attribute(element, "style", style) {
                    warn!(error = %e, "Failed to restore inline style");
                }
            }
            None => self.dom.remove_attribute(element, "style"),
        }
    }

    pub fn start_inline_edit(&mut self, element: D::Node) {
        if self.state.is_editing(&element) {
            return;
        }
        self.end_inline_edit(false);

        let original_text = self.dom.text_content(&element);
        let identity = self.cache.get(&self.dom, &element).identity;

        for (name, value) in [(EDITING_ATTR, "true"), (CONTENT_EDITABLE_ATTR, "true")] {
            if let Err(e) = self.dom.set_attribute(&element, name, value) {
                warn!(error = %e, "Failed to make element editable");
                self.dom.remove_attribute(&element, EDITING_ATTR);
                self.dom.remove_attribute(&element, CONTENT_EDITABLE_ATTR);
                return;
            }
        }
        if let Err(e) = self.dom.focus(&element) {
            warn!(error = %e, "Failed to focus edited element");
        }
        for listener in ElementListener::ALL {
            if let Err(e) = self.dom.add_element_listener(&element, listener) {
                warn!(event = listener.event_type(), error = %e, "Failed to add edit listener");
            }
        }

        debug!(identity = ?identity.as_ref().map(|i| i.as_str()), "Inline edit started");
        self.state.session = Some(InlineEditSession::new(
            element.clone(),
            original_text,
            identity,
        ));

        let started = build_descriptor(&self.dom, &mut self.cache, &element, false);
        self.emit(Outbound::InlineEditStarted(started));
        let detailed = build_descriptor(&self.dom, &mut self.cache, &element, true);
        self.emit(Outbound::OpenEditUi(detailed));
    }

    /// End the inline edit, if any. Without `commit` the original text is restored.
    pub fn end_inline_edit(&mut self, commit: bool) {
        let Some(session) = self.state.session.take() else {
            return;
        };
        let element = &session.element;
        let current_text = self.dom.text_content(element);

        if !commit {
            self.dom.set_text_content(element, &session.original_text);
        }

        self.dom.remove_attribute(element, CONTENT_EDITABLE_ATTR);
        self.dom.remove_attribute(element, EDITING_ATTR);
        for listener in ElementListener::ALL {
            self.dom.remove_element_listener(element, listener);
        }

        let outcome = session.outcome(&current_text, commit);
        debug!(changed = outcome.changed, "Inline edit ended");
        self.emit(Outbound::InlineEditEnded(outcome));
    }

    fn selected_or_warn(&self, kind: &str) -> Option<D::Node> {
        let selected = self.state.selected().cloned();
        if selected.is_none() {
            warn!(kind, "No element selected");
        }
        selected
    }

    fn update_text(&mut self, text: &str) -> CommandOutcome {
        let Some(element) = self.selected_or_warn("UPDATE_TEXT_CONTENT") else {
            return CommandOutcome::NoSelection;
        };
        self.dom.set_text_content(&element, text);
        CommandOutcome::Applied
    }

    fn update_styles(&mut self, styles: &BTreeMap<String, String>) -> CommandOutcome {
        let Some(element) = self.selected_or_warn("UPDATE_STYLES") else {
            return CommandOutcome::NoSelection;
        };
        for (property, value) in styles {
            if let Err(e) = self.dom.set_style_property(&element, property, value) {
                warn!(property = %property, error = %e, "Failed to apply style");
            }
        }
        CommandOutcome::Applied
    }

    fn update_classes(&mut self, changes: &ClassChanges) -> CommandOutcome {
        let Some(element) = self.selected_or_warn("UPDATE_CLASSES") else {
            return CommandOutcome::NoSelection;
        };
        for class in &changes.remove {
            if let Err(e) = self.dom.remove_class(&element, class) {
                warn!(class = %class, error = %e, "Failed to remove class");
            }
        }
        for class in &changes.add {
            if let Err(e) = self.dom.add_class(&element, class) {
                warn!(class = %class, error = %e, "Failed to add class");
            }
        }
        CommandOutcome::Applied
    }

    fn delete_selected(&mut self) -> CommandOutcome {
        let Some(element) = self.selected_or_warn("DELETE_ELEMENT") else {
            return CommandOutcome::NoSelection;
        };

        if self.state.is_editing(&element) {
            self.end_inline_edit(false);
        }
        if let Some(hover) = self.state.hover.clone() {
            if self.contains(&element, &hover) {
                self.clear_hover(false);
            }
        }

        if !self.dom.remove_element(&element) {
            warn!("Selected element has no parent");
            return CommandOutcome::Ignored;
        }

        debug!("Deleted selected element");
        self.dom.remove_attribute(&element, SELECTED_ATTR);
        self.cache.forget(self.dom.node_key(&element));
        self.state.selection = None;
        CommandOutcome::Applied
    }

    /// Nearest ancestor-or-self carrying an identity, stopping at the document root.
    fn find_identified(&self, target: &D::Node) -> Option<D::Node> {
        let mut current = Some(target.clone());
        while let Some(node) = current {
            if self.dom.is_document_root(&node) {
                return None;
            }
            if self.dom.attribute(&node, IDENTITY_ATTR).is_some() {
                return Some(node);
            }
            current = self.dom.parent_element(&node);
        }
        None
    }

    fn contains(&self, ancestor: &D::Node, node: &D::Node) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if n == *ancestor {
                return true;
            }
            current = self.dom.parent_element(&n);
        }
        false
    }

    fn emit(&mut self, message: Outbound) {
        if let Err(e) = send(&mut self.channel, &message, &self.config.agent_tag) {
            error!(kind = message.kind(), error = %e, "Failed to post message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RecordingChannel;
    use crate::memory::{MemoryDom, NodeId};
    use liveedit_protocol::Rect;

    fn agent() -> EditorAgent<MemoryDom, RecordingChannel> {
        EditorAgent::new(MemoryDom::new(), RecordingChannel::new(), AgentConfig::default())
    }

    fn enabled() -> EditorAgent<MemoryDom, RecordingChannel> {
        let mut agent = agent();
        agent.set_mode(EditMode::Enabled);
        agent.channel_mut().clear();
        agent
    }

    fn text_element(agent: &mut EditorAgent<MemoryDom, RecordingChannel>, tag: &str, text: &str) -> NodeId {
        let dom = agent.dom_mut();
        let body = dom.body();
        let element = dom.append_identified(body, tag, "a.tsx:1:0");
        dom.append_text(element, text);
        element
    }

    #[test]
    fn test_only_enable_leaves_disabled() {
        let mut agent = agent();
        assert!(!agent.set_mode(EditMode::Saving));
        assert!(!agent.set_mode(EditMode::Disabled));
        assert_eq!(agent.mode(), EditMode::Disabled);
        assert!(agent.channel().sent().is_empty());

        assert!(agent.set_mode(EditMode::Enabled));
        assert_eq!(agent.channel().kinds(), ["EDIT_MODE_STATE"]);
    }

    #[test]
    fn test_enable_sets_up_page() {
        let agent = enabled();
        let dom = agent.dom();
        assert!(dom.stylesheet(OVERLAY_STYLE_ID).is_some());
        assert!(dom.stylesheet(SCROLL_OVERRIDE_ID).is_some());
        assert_eq!(dom.body_cursor(), Some("crosshair"));
        assert_eq!(dom.total_document_listeners(), DocumentListener::ALL.len());
    }

    #[test]
    fn test_saving_is_silent_and_leaving_it_is_reported() {
        let mut agent = enabled();
        agent.set_mode(EditMode::Saving);
        assert!(agent.channel().sent().is_empty());
        let body = agent.dom().body();
        assert_eq!(agent.dom().attribute(&body, SAVING_ATTR).as_deref(), Some("true"));

        agent.set_mode(EditMode::Enabled);
        assert_eq!(agent.channel().kinds(), ["EDIT_MODE_STATE"]);
        assert_eq!(agent.dom().attribute(&body, SAVING_ATTR), None);
    }

    #[test]
    fn test_click_outside_identified_elements_clears_selection() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let plain = agent.dom_mut().append_element(body, "div");

        let response = agent.handle_event(DomEvent::Click { target: plain });

        assert_eq!(response, EventResponse::BLOCK);
        let sent = agent.channel().last().unwrap();
        assert_eq!(sent.kind, "ELEMENT_CLICKED");
        assert!(sent.payload.is_null());
    }

    #[test]
    fn test_click_on_container_selects_without_editing() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let section = agent.dom_mut().append_identified(body, "section", "a.tsx:2:0");
        let inner = agent.dom_mut().append_element(section, "div");

        agent.handle_event(DomEvent::Click { target: inner });

        assert_eq!(agent.channel().kinds(), ["ELEMENT_CLICKED"]);
        assert_eq!(agent.state().selected(), Some(&section));
        assert!(agent.state().session.is_none());
    }

    #[test]
    fn test_click_on_preformatted_is_ignored() {
        let mut agent = enabled();
        let pre = text_element(&mut agent, "pre", "raw   text");

        agent.handle_event(DomEvent::Click { target: pre });

        assert!(agent.channel().sent().is_empty());
        assert!(agent.state().selection.is_none());
    }

    #[test]
    fn test_click_on_non_editable_keeps_selection() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let section = agent.dom_mut().append_identified(body, "section", "a.tsx:1:0");
        let pre = agent.dom_mut().append_identified(body, "pre", "a.tsx:2:0");
        agent.dom_mut().append_text(pre, "raw");
        agent.handle_event(DomEvent::Click { target: section });
        agent.channel_mut().clear();

        assert_eq!(agent.handle_event(DomEvent::Click { target: pre }), EventResponse::BLOCK);

        assert!(agent.channel().sent().is_empty());
        assert_eq!(agent.state().selected(), Some(&section));
        assert_eq!(agent.dom().attribute(&section, SELECTED_ATTR).as_deref(), Some("true"));
    }

    #[test]
    fn test_click_after_white_space_change_does_not_edit() {
        let mut agent = enabled();
        let p = text_element(&mut agent, "p", "Hello");
        agent.handle_event(DomEvent::Click { target: p });
        agent.handle_event(DomEvent::Blur { element: p });
        agent.handle_command(Inbound::ClearSelection);

        // A `whitespace-pre` class landing on the element
        agent.dom_mut().set_computed_style(p, "whiteSpace", "pre");
        agent.channel_mut().clear();

        let response = agent.handle_event(DomEvent::Click { target: p });

        assert_eq!(response, EventResponse::BLOCK);
        assert!(agent.channel().sent().is_empty());
        assert!(agent.state().session.is_none());
        assert!(agent.state().selection.is_none());
        assert!(agent.dom().attribute(&p, CONTENT_EDITABLE_ATTR).is_none());
    }

    #[test]
    fn test_click_in_disabled_mode_passes_through() {
        let mut agent = agent();
        let span = text_element(&mut agent, "span", "Hi");
        assert_eq!(agent.handle_event(DomEvent::Click { target: span }), EventResponse::PASS);
        assert!(agent.channel().sent().is_empty());
    }

    #[test]
    fn test_click_inside_edited_element_passes_through() {
        let mut agent = enabled();
        let span = text_element(&mut agent, "span", "Hi");
        agent.handle_event(DomEvent::Click { target: span });
        agent.channel_mut().clear();

        assert_eq!(agent.handle_event(DomEvent::Click { target: span }), EventResponse::PASS);
        assert!(agent.channel().sent().is_empty());
    }

    #[test]
    fn test_submit_blocking() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let tracked = agent.dom_mut().append_identified(body, "form", "a.tsx:3:0");
        let untracked = agent.dom_mut().append_element(body, "form");

        assert_eq!(agent.handle_event(DomEvent::Submit { target: tracked }), EventResponse::PREVENT);
        assert_eq!(agent.handle_event(DomEvent::Submit { target: untracked }), EventResponse::BLOCK);
    }

    #[test]
    fn test_hover_marks_innermost_editable_element() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let outer = agent.dom_mut().append_identified(body, "section", "a.tsx:1:0");
        let inner = agent.dom_mut().append_identified(outer, "p", "a.tsx:2:2");
        agent.dom_mut().set_viewport_width(800.0);
        agent.dom_mut().set_rect(inner, Rect::new(0.0, 0.0, 797.0, 20.0));

        agent.handle_event(DomEvent::PointerOver { target: inner });

        assert_eq!(agent.state().hover, Some(inner));
        assert!(agent.dom().attribute(&inner, HOVERED_ATTR).is_some());
        assert!(agent.dom().attribute(&inner, FULL_WIDTH_ATTR).is_some());
        assert!(agent.dom().attribute(&outer, HOVERED_ATTR).is_none());

        let sent = agent.channel().last().unwrap();
        assert_eq!(sent.kind, "ELEMENT_HOVERED");
        assert!(sent.payload.get("styles").is_none());
    }

    #[test]
    fn test_scroll_clears_hover() {
        let mut agent = enabled();
        let p = text_element(&mut agent, "p", "x");
        agent.handle_event(DomEvent::PointerOver { target: p });
        agent.channel_mut().clear();

        agent.handle_event(DomEvent::Scroll);

        assert_eq!(agent.state().hover, None);
        assert!(agent.dom().attribute(&p, HOVERED_ATTR).is_none());
        assert!(agent.channel().last().unwrap().payload.is_null());

        // Nothing left to clear
        agent.handle_event(DomEvent::Scroll);
        assert_eq!(agent.channel().sent().len(), 1);
    }

    #[test]
    fn test_no_hover_while_saving_or_on_selection() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let div = agent.dom_mut().append_identified(body, "div", "a.tsx:1:0");

        agent.handle_event(DomEvent::Click { target: div });
        agent.handle_event(DomEvent::PointerOver { target: div });
        assert_eq!(agent.state().hover, None);

        agent.set_mode(EditMode::Saving);
        let p = text_element(&mut agent, "p", "x");
        agent.handle_event(DomEvent::PointerOver { target: p });
        assert_eq!(agent.state().hover, None);
    }

    #[test]
    fn test_edit_escape_cancels_and_restores_text() {
        let mut agent = enabled();
        let span = text_element(&mut agent, "span", "Hi");
        agent.handle_event(DomEvent::Click { target: span });
        agent.dom_mut().set_text_content(&span, "Hello");

        // Document handler leaves Escape to the session
        assert_eq!(
            agent.handle_event(DomEvent::KeyDown { key: "Escape".into() }),
            EventResponse::PASS
        );
        assert!(agent.state().session.is_some());

        let response = agent.handle_event(DomEvent::EditKeyDown {
            element: span,
            key: "Escape".into(),
        });

        assert_eq!(response, EventResponse::PREVENT);
        assert_eq!(agent.dom().text_content(&span), "Hi");
        assert!(agent.dom().attribute(&span, CONTENT_EDITABLE_ATTR).is_none());
        assert_eq!(agent.dom().element_listener_count(span, ElementListener::Input), 0);
        assert_eq!(agent.channel().last().unwrap().payload["state"], "cancelled");
    }

    #[test]
    fn test_escape_without_session_clears_selection() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let div = agent.dom_mut().append_identified(body, "div", "a.tsx:1:0");
        agent.handle_event(DomEvent::Click { target: div });
        agent.channel_mut().clear();

        agent.handle_event(DomEvent::KeyDown { key: "Escape".into() });

        assert!(agent.state().selection.is_none());
        assert!(agent.dom().attribute(&div, SELECTED_ATTR).is_none());
        assert_eq!(agent.channel().kinds(), ["SELECTION_CLEARED"]);
    }

    #[test]
    fn test_input_streams_text() {
        let mut agent = enabled();
        let span = text_element(&mut agent, "span", "Hi");
        agent.handle_event(DomEvent::Click { target: span });
        agent.channel_mut().clear();

        agent.dom_mut().set_text_content(&span, "Hi!");
        agent.handle_event(DomEvent::Input { element: span });
        agent.dom_mut().set_text_content(&span, "Hi!!");
        agent.handle_event(DomEvent::Input { element: span });

        assert_eq!(agent.channel().kinds(), ["ELEMENT_TEXT_UPDATED", "ELEMENT_TEXT_UPDATED"]);
        let last = agent.channel().last().unwrap();
        assert_eq!(last.payload["text"], "Hi!!");
        assert_eq!(last.payload["metadata"]["id"], "a.tsx:1:0");
    }

    #[test]
    fn test_blur_commits() {
        let mut agent = enabled();
        let span = text_element(&mut agent, "span", "Hi");
        agent.handle_event(DomEvent::Click { target: span });
        agent.dom_mut().set_text_content(&span, "Bye");

        agent.handle_event(DomEvent::Blur { element: span });

        assert_eq!(agent.dom().text_content(&span), "Bye");
        let outcome = &agent.channel().last().unwrap().payload;
        assert_eq!(outcome["state"], "saved");
        assert_eq!(outcome["text"], "Bye");
        assert_eq!(outcome["originalText"], "Hi");
        assert_eq!(outcome["changed"], true);
    }

    #[test]
    fn test_style_preview_rolled_back_on_reselect() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let a = agent.dom_mut().append_identified(body, "div", "a.tsx:1:0");
        agent.dom_mut().set_attribute(&a, "style", "color: red").unwrap();
        let b = agent.dom_mut().append_identified(body, "div", "a.tsx:2:0");

        agent.handle_event(DomEvent::Click { target: a });
        let mut styles = BTreeMap::new();
        styles.insert("fontSize".to_string(), "20px".to_string());
        assert_eq!(agent.handle_command(Inbound::UpdateStyles(styles)), CommandOutcome::Applied);
        assert_eq!(agent.dom().computed_style(&a, "fontSize").as_deref(), Some("20px"));

        agent.handle_event(DomEvent::Click { target: b });

        assert_eq!(agent.dom().computed_style(&a, "fontSize"), None);
        assert_eq!(agent.dom().computed_style(&a, "color").as_deref(), Some("red"));
        assert!(agent.dom().attribute(&a, SELECTED_ATTR).is_none());
    }

    #[test]
    fn test_update_classes_and_text() {
        let mut agent = enabled();
        let body = agent.dom().body();
        let div = agent.dom_mut().append_identified(body, "div", "a.tsx:1:0");
        agent.dom_mut().set_attribute(&div, "class", "p-2 text-sm").unwrap();
        agent.handle_event(DomEvent::Click { target: div });

        agent.handle_command(Inbound::UpdateClasses(ClassChanges {
            add: vec!["text-lg".into()],
            remove: vec!["text-sm".into()],
        }));
        agent.handle_command(Inbound::UpdateText("New".into()));

        assert_eq!(agent.dom().attribute(&div, "class").as_deref(), Some("p-2 text-lg"));
        assert_eq!(agent.dom().text_content(&div), "New");
    }

    #[test]
    fn test_delete_cancels_session_on_deleted_element() {
        let mut agent = enabled();
        let span = text_element(&mut agent, "span", "Hi");
        agent.handle_event(DomEvent::Click { target: span });
        agent.channel_mut().clear();

        assert_eq!(agent.handle_command(Inbound::DeleteElement), CommandOutcome::Applied);

        assert!(!agent.dom().is_connected(&span));
        assert!(agent.state().session.is_none());
        assert!(agent.state().selection.is_none());
        assert_eq!(agent.channel().kinds(), ["INLINE_EDIT_STATE"]);
    }

    #[test]
    fn test_ready_waits_for_identified_elements() {
        let mut agent = agent();
        agent.dom_mut().set_location("http://localhost:3000/");
        agent.start();
        assert!(agent.channel().sent().is_empty());

        text_element(&mut agent, "p", "x");
        agent.notify_content_changed();
        agent.notify_content_changed();

        assert_eq!(agent.channel().kinds(), ["READY"]);
        let payload = &agent.channel().last().unwrap().payload;
        assert_eq!(payload["count"], 1);
        assert_eq!(payload["url"], "http://localhost:3000/");
        assert!(payload["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_send_failures_are_swallowed() {
        let mut agent =
            EditorAgent::new(MemoryDom::new(), RecordingChannel::failing(), AgentConfig::default());
        assert!(agent.set_mode(EditMode::Enabled));
        assert_eq!(agent.mode(), EditMode::Enabled);
    }
}
