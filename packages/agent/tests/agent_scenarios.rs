//! End-to-end agent behaviour over the in-memory document

use liveedit_agent::overlay::{OVERLAY_STYLE_ID, SCROLL_OVERRIDE_ID, SELECTED_ATTR};
use liveedit_agent::*;
use liveedit_protocol::EditMode;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

type TestAgent = EditorAgent<MemoryDom, RecordingChannel>;

/// Counts WARN events.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(count.clone()));
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, count.load(Ordering::SeqCst))
}

fn host_agent() -> TestAgent {
    let config = AgentConfig::default().with_host_tag("host");
    EditorAgent::new(MemoryDom::new(), RecordingChannel::new(), config)
}

fn command(kind: &str, payload: Value) -> Value {
    json!({ "type": kind, "payload": payload, "sourceTag": "host" })
}

fn enable(agent: &mut TestAgent) {
    agent.receive(command("SET_STATE", json!({ "state": "enabled" })), true);
    agent.channel_mut().clear();
}

#[test]
fn test_scenario_enable_from_trusted_host() {
    let mut agent = host_agent();

    let outcome = agent.receive(command("SET_STATE", json!({ "state": "enabled" })), true);

    assert_eq!(outcome, Some(CommandOutcome::Applied));
    assert_eq!(agent.mode(), EditMode::Enabled);
    assert!(agent.dom().stylesheet(OVERLAY_STYLE_ID).is_some());
    assert_eq!(agent.channel().kinds(), ["EDIT_MODE_STATE"]);

    let envelope = agent.channel().last().unwrap();
    assert_eq!(envelope.payload, json!({ "state": "enabled" }));
    assert_eq!(envelope.source.as_deref(), Some("softgen-iframe"));
}

#[test]
fn test_scenario_click_text_starts_inline_edit() {
    let mut agent = host_agent();
    enable(&mut agent);
    let dom = agent.dom_mut();
    let body = dom.body();
    let span = dom.append_identified(body, "span", "src/hero.tsx:8:6");
    dom.append_text(span, "Hi");

    agent.handle_event(DomEvent::Click { target: span });

    assert_eq!(
        agent.channel().kinds(),
        ["ELEMENT_CLICKED", "INLINE_EDIT_STATE", "OPEN_EDITOR_POPOVER"]
    );
    let sent = agent.channel().sent();
    assert_eq!(sent[0].payload["textContent"], "Hi");
    assert_eq!(sent[0].payload["identity"]["id"], "src/hero.tsx:8:6");
    assert!(sent[0].payload["styles"].is_object());
    assert!(sent[0].payload["geometry"].is_object());
    assert_eq!(sent[1].payload["state"], "started");
    assert_eq!(sent[1].payload["identity"]["id"], "src/hero.tsx:8:6");
    assert!(sent[2].payload["styles"].is_object());

    assert_eq!(agent.dom().attribute(&span, "contenteditable").as_deref(), Some("true"));
    assert_eq!(agent.dom().focused(), Some(span));
    assert_eq!(agent.dom().element_listener_count(span, ElementListener::Blur), 1);
}

#[test]
fn test_scenario_delete_without_selection() {
    let mut agent = host_agent();
    enable(&mut agent);
    let body = agent.dom().body();
    agent.dom_mut().append_identified(body, "p", "a.tsx:1:0");
    let before = agent.dom().content_mutations();

    let (outcome, warnings) =
        count_warnings(|| agent.receive(command("DELETE_ELEMENT", Value::Null), true));

    assert_eq!(outcome, Some(CommandOutcome::NoSelection));
    assert_eq!(warnings, 1);
    assert_eq!(agent.dom().content_mutations(), before);
    assert_eq!(agent.dom().identified_elements().len(), 1);
    assert!(agent.channel().sent().is_empty());
}

#[test]
fn test_untrusted_traffic_is_silently_dropped() {
    let mut agent = host_agent();
    let enable_cmd = command("SET_STATE", json!({ "state": "enabled" }));

    let (_, warnings) = count_warnings(|| {
        assert_eq!(agent.receive(enable_cmd.clone(), false), None);
        let wrong_tag = json!({ "type": "SET_STATE", "payload": { "state": "enabled" }, "source": "other" });
        assert_eq!(agent.receive(wrong_tag, true), None);
        assert_eq!(agent.receive(json!("SET_STATE"), true), None);
    });

    assert_eq!(warnings, 0);
    assert_eq!(agent.mode(), EditMode::Disabled);
    assert!(agent.channel().sent().is_empty());
}

#[test]
fn test_unknown_and_malformed_commands_warn() {
    let mut agent = host_agent();

    let (_, warnings) = count_warnings(|| {
        assert_eq!(agent.receive(command("RELOAD_PAGE", json!({})), true), None);
        assert_eq!(
            agent.receive(command("SET_STATE", json!({ "state": "paused" })), true),
            None
        );
    });

    assert_eq!(warnings, 2);
    assert_eq!(agent.mode(), EditMode::Disabled);
}

#[test]
fn test_same_mode_commands_emit_nothing() {
    let mut agent = host_agent();
    enable(&mut agent);

    for _ in 0..3 {
        let outcome = agent.receive(command("SET_STATE", json!({ "state": "enabled" })), true);
        assert_eq!(outcome, Some(CommandOutcome::Ignored));
    }
    agent.receive(command("SET_STATE", json!({ "state": "saving" })), true);
    agent.receive(command("SET_STATE", json!({ "state": "saving" })), true);

    assert!(agent.channel().sent().is_empty());
    assert_eq!(agent.dom().total_document_listeners(), DocumentListener::ALL.len());
}

#[test]
fn test_enable_disable_cycles_do_not_accumulate() {
    let mut agent = host_agent();

    for _ in 0..5 {
        agent.set_mode(EditMode::Enabled);
        agent.set_mode(EditMode::Saving);
        agent.set_mode(EditMode::Enabled);
        assert_eq!(agent.dom().stylesheet_count(), 2);
        assert_eq!(agent.dom().total_document_listeners(), DocumentListener::ALL.len());
        agent.set_mode(EditMode::Disabled);
    }

    let dom = agent.dom();
    assert_eq!(dom.stylesheet_count(), 0);
    assert!(dom.stylesheet(SCROLL_OVERRIDE_ID).is_none());
    assert_eq!(dom.total_document_listeners(), 0);
    assert_eq!(dom.body_cursor(), None);
}

#[test]
fn test_cancel_restores_exact_text() {
    let mut agent = host_agent();
    enable(&mut agent);
    let dom = agent.dom_mut();
    let body = dom.body();
    let h1 = dom.append_identified(body, "h1", "a.tsx:2:4");
    dom.append_text(h1, "  Welcome\n  back ");
    let before = agent.dom().text_content(&h1);

    agent.handle_event(DomEvent::Click { target: h1 });
    agent.dom_mut().set_text_content(&h1, "Something else");
    agent.receive(command("CLEAR_SELECTION", Value::Null), true);

    assert_eq!(agent.dom().text_content(&h1), before);
    assert!(agent.dom().attribute(&h1, SELECTED_ATTR).is_none());
    assert_eq!(
        agent.channel().kinds()[3..],
        ["INLINE_EDIT_STATE", "SELECTION_CLEARED"]
    );
}

#[test]
fn test_commit_flag_follows_text() {
    let mut agent = host_agent();
    enable(&mut agent);
    let dom = agent.dom_mut();
    let body = dom.body();
    let p = dom.append_identified(body, "p", "a.tsx:3:4");
    dom.append_text(p, "Same");

    agent.handle_event(DomEvent::Click { target: p });
    agent.handle_event(DomEvent::Blur { element: p });
    assert_eq!(agent.channel().last().unwrap().payload["changed"], false);

    agent.handle_event(DomEvent::Click { target: p });
    agent.dom_mut().set_text_content(&p, "Different");
    agent.handle_event(DomEvent::Blur { element: p });
    let outcome = &agent.channel().last().unwrap().payload;
    assert_eq!(outcome["changed"], true);
    assert_eq!(outcome["state"], "saved");
    assert_eq!(outcome["metadata"]["line"], 3);
}

#[test]
fn test_saving_cancels_edit_and_clears_selection() {
    let mut agent = host_agent();
    enable(&mut agent);
    let dom = agent.dom_mut();
    let body = dom.body();
    let li = dom.append_identified(body, "li", "a.tsx:9:6");
    dom.append_text(li, "Item");

    agent.handle_event(DomEvent::Click { target: li });
    agent.dom_mut().set_text_content(&li, "Item 2");
    agent.channel_mut().clear();
    agent.receive(command("SET_STATE", json!({ "state": "saving" })), true);

    assert_eq!(agent.mode(), EditMode::Saving);
    assert_eq!(agent.dom().text_content(&li), "Item");
    assert!(agent.state().selection.is_none());
    assert_eq!(agent.channel().kinds(), ["INLINE_EDIT_STATE"]);
    assert_eq!(agent.channel().last().unwrap().payload["state"], "cancelled");

    // Clicks still select while saving
    agent.handle_event(DomEvent::Click { target: li });
    assert_eq!(agent.state().selected(), Some(&li));
}

#[test]
fn test_disable_rolls_back_style_previews() {
    let mut agent = host_agent();
    enable(&mut agent);
    let body = agent.dom().body();
    let card = agent.dom_mut().append_identified(body, "div", "a.tsx:5:2");

    agent.handle_event(DomEvent::Click { target: card });
    agent.receive(
        command("UPDATE_STYLES", json!({ "backgroundColor": "#fff", "opacity": 0.5, "color": null })),
        true,
    );
    assert_eq!(agent.dom().computed_style(&card, "opacity").as_deref(), Some("0.5"));

    agent.receive(command("SET_STATE", json!({ "state": "disabled" })), true);

    assert_eq!(agent.dom().attribute(&card, "style"), None);
    assert_eq!(agent.channel().last().unwrap().payload["state"], "disabled");
}

#[test]
fn test_disabled_agent_ignores_page_events() {
    let mut agent = host_agent();
    let dom = agent.dom_mut();
    let body = dom.body();
    let a = dom.append_identified(body, "a", "a.tsx:1:0");
    dom.append_text(a, "Home");

    assert_eq!(agent.handle_event(DomEvent::Click { target: a }), EventResponse::PASS);
    assert_eq!(agent.handle_event(DomEvent::PointerOver { target: a }), EventResponse::PASS);
    assert_eq!(
        agent.handle_event(DomEvent::KeyDown { key: "Escape".into() }),
        EventResponse::PASS
    );
    assert!(agent.channel().sent().is_empty());
}
