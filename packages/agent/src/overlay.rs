//! Markers and stylesheets the agent adds to the page

pub const OVERLAY_STYLE_ID: &str = "sg-visual-editor-styles";
pub const SCROLL_OVERRIDE_ID: &str = "sg-scroll-override";

pub const SELECTED_ATTR: &str = "data-sg-selected";
pub const EDITING_ATTR: &str = "data-sg-editing";
pub const HOVERED_ATTR: &str = "data-sg-hovered";
pub const FULL_WIDTH_ATTR: &str = "data-sg-full-width";
pub const CONTENT_EDITABLE_ATTR: &str = "contenteditable";

/// Set on `body` while the host is saving
pub const SAVING_ATTR: &str = "data-sg-saving";

pub const EDIT_CURSOR: &str = "crosshair";

pub const SCROLL_OVERRIDE_CSS: &str = "* { scroll-behavior: auto !important; }";

pub const OVERLAY_CSS: &str = r#"
body:not([data-sg-saving]) [data-sg-hovered]:not([data-sg-selected]) {
  outline: 2px dashed rgba(93,208,220) !important;
  outline-offset: 2px !important;
  cursor: pointer !important;
  transition: outline 0.15s ease !important;
}

body:not([data-sg-saving]) [data-sg-hovered][data-sg-full-width]:not([data-sg-selected]) {
  outline-offset: -2px !important;
}

[data-sg-selected] {
  outline: 2px dashed rgba(93,208,220) !important;
  outline-offset: 2px !important;
  cursor: pointer !important;
  transition: outline 0.15s ease !important;
}

[data-sg-editing] {
  cursor: text !important;
  outline: none !important;
  box-shadow: 0 0 0 2px rgba(93,208,220) !important;
}

[data-sg-selected][data-sg-editing] {
  outline: none !important;
}

[contenteditable="true"] {
  outline: none !important;
}
"#;
