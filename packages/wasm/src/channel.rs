//! `postMessage` transport to the embedding window

use liveedit_agent::{Channel, ChannelError};
use liveedit_protocol::Envelope;
use serde::Serialize;
use wasm_bindgen::JsValue;
use web_sys::Window;

pub struct PostMessageChannel {
    window: Window,
    target_origin: String,
}

impl PostMessageChannel {
    pub fn new(window: Window, target_origin: impl Into<String>) -> Self {
        Self {
            window,
            target_origin: target_origin.into(),
        }
    }
}

impl Channel for PostMessageChannel {
    fn post(&mut self, envelope: &Envelope) -> Result<(), ChannelError> {
        let parent = self
            .window
            .parent()
            .ok()
            .flatten()
            .ok_or(ChannelError::NoParent)?;

        // Plain objects rather than JS Maps, so structured clone keeps them readable.
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let message = envelope
            .serialize(&serializer)
            .map_err(|e| ChannelError::Post(e.to_string()))?;

        parent
            .post_message(&message, &self.target_origin)
            .map_err(|e| ChannelError::Post(describe(&e)))
    }
}

/// Whether `source` (a `MessageEvent.source`) is this window's parent.
pub fn is_parent(window: &Window, source: Option<js_sys::Object>) -> bool {
    let (Some(source), Ok(Some(parent))) = (source, window.parent()) else {
        return false;
    };
    js_sys::Object::is(&source, &parent)
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
