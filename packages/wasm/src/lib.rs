//! # WebAssembly bindings
//!
//! - `tagSource` / `tagFile`: the source tagger, for JS build loaders
//! - `startAgent`: the in-page editor agent over the real DOM

mod agent;
mod channel;
mod dom;
mod logging;

pub use agent::{AgentHandle, StartOptions};
pub use channel::PostMessageChannel;
pub use dom::WebDom;
pub use logging::ConsoleLayer;

use liveedit_tagger::{BuildMode, Tagger, TaggerOptions};
use tracing::Level;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub struct TagOutput {
    code: String,
    inserted: usize,
    map: Option<String>,
}

#[wasm_bindgen]
impl TagOutput {
    #[wasm_bindgen(getter)]
    pub fn code(&self) -> String {
        self.code.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// Source map JSON, when requested
    #[wasm_bindgen(getter)]
    pub fn map(&self) -> Option<String> {
        self.map.clone()
    }
}

fn tagger_options(development: bool) -> TaggerOptions {
    let mode = if development {
        BuildMode::Development
    } else {
        BuildMode::Production
    };
    TaggerOptions::default().with_mode(mode)
}

/// Tag JSX/TSX source. Returns the input unchanged on any failure.
#[wasm_bindgen(js_name = tagSource)]
pub fn tag_source(source: &str, file_path: &str, development: bool) -> String {
    match Tagger::new(tagger_options(development)) {
        Ok(mut tagger) => tagger.tag(source, file_path),
        Err(_) => source.to_string(),
    }
}

/// Tag JSX/TSX source and report counts and, optionally, a source map.
#[wasm_bindgen(js_name = tagFile)]
pub fn tag_file(source: &str, file_path: &str, development: bool, source_maps: bool) -> TagOutput {
    let options = tagger_options(development).with_source_maps(source_maps);
    let Ok(mut tagger) = Tagger::new(options) else {
        return TagOutput {
            code: source.to_string(),
            inserted: 0,
            map: None,
        };
    };

    let report = tagger.tag_file(source, file_path);
    let map = report.source_map.as_ref().and_then(|map| {
        let mut buffer = Vec::new();
        map.to_writer(&mut buffer).ok()?;
        String::from_utf8(buffer).ok()
    });

    TagOutput {
        code: report.code,
        inserted: report.inserted,
        map,
    }
}

/// Start the editor agent in this document.
///
/// `options` is an optional object: `{hostTag, agentTag, fullWidthTolerance,
/// cursor, targetOrigin, logLevel}`.
#[wasm_bindgen(js_name = startAgent)]
pub fn start_agent(options: JsValue) -> Result<AgentHandle, JsValue> {
    let options: StartOptions = if options.is_undefined() || options.is_null() {
        StartOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)?
    };

    let level = options
        .log_level
        .as_deref()
        .and_then(logging::parse_level)
        .unwrap_or(Level::INFO);
    logging::init(level);

    agent::start(options)
}
