//! `tracing` output to the browser console

use std::fmt::{self, Write};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

const PREFIX: &str = "[Visual Editor]";

/// Sends events at or above `max_level` to `console.*`.
pub struct ConsoleLayer {
    max_level: Level,
}

impl ConsoleLayer {
    pub fn new(max_level: Level) -> Self {
        Self { max_level }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > self.max_level {
            return;
        }

        let mut line = FieldWriter::default();
        event.record(&mut line);
        let text = format!("{} {}", PREFIX, line.finish());
        let value = wasm_bindgen::JsValue::from_str(&text);

        match level {
            Level::ERROR => web_sys::console::error_1(&value),
            Level::WARN => web_sys::console::warn_1(&value),
            Level::INFO => web_sys::console::info_1(&value),
            _ => web_sys::console::debug_1(&value),
        }
    }
}

/// `message key=value key=value`
#[derive(Default)]
struct FieldWriter {
    message: String,
    fields: String,
}

impl FieldWriter {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for FieldWriter {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Install the console layer as the global subscriber. Later calls are no-ops.
pub fn init(max_level: Level) {
    let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(max_level));
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn parse_level(name: &str) -> Option<Level> {
    name.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_field_writer_output() {
        let writer = FieldWriter {
            message: "Mode changed".to_string(),
            fields: " from=disabled to=enabled".to_string(),
        };
        assert_eq!(writer.finish(), "Mode changed from=disabled to=enabled");
    }
}
