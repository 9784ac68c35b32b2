//! # Protocol messages
//!
//! Closed sets of commands (host → agent) and events (agent → host).
//!
//! ## Wire names
//!
//! | Direction | Type | Payload |
//! |---|---|---|
//! | out | `READY` | `{count, url, timestamp}` |
//! | out | `EDIT_MODE_STATE` | `{state}` |
//! | out | `ELEMENT_CLICKED` | descriptor or `null` |
//! | out | `ELEMENT_HOVERED` | descriptor or `null` |
//! | out | `INLINE_EDIT_STATE` | `{state: "started", ..descriptor}` or outcome |
//! | out | `ELEMENT_TEXT_UPDATED` | `{text, metadata}` |
//! | out | `OPEN_EDITOR_POPOVER` | descriptor |
//! | out | `SELECTION_CLEARED` | `{}` |
//! | in | `SET_STATE` | `{state}` |
//! | in | `UPDATE_TEXT_CONTENT` | `{text}` |
//! | in | `UPDATE_STYLES` | `{property: value}` |
//! | in | `UPDATE_CLASSES` | `{add, remove}` |
//! | in | `DELETE_ELEMENT` | ignored |
//! | in | `CLEAR_SELECTION` | ignored |

use crate::error::{ProtocolError, ProtocolResult};
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Interaction mode of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Disabled,
    Enabled,
    Saving,
}

impl EditMode {
    /// Edit interactions (click, escape, hover) are live
    pub fn is_active(self) -> bool {
        !matches!(self, EditMode::Disabled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditMode::Disabled => "disabled",
            EditMode::Enabled => "enabled",
            EditMode::Saving => "saving",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and size of an element relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Serializable summary of one element, built fresh for every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    pub identity: Option<Identity>,
    pub display_name: String,
    pub tag_name: String,
    pub text_content: String,
    pub is_text_editable: bool,
    pub can_edit_styles: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyPayload {
    /// Number of identified elements present when the agent became ready
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineEditState {
    Started,
    Saved,
    Cancelled,
}

/// Final event of an inline-edit session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineEditOutcome {
    pub state: InlineEditState,
    pub text: String,
    pub original_text: String,
    pub metadata: Option<Identity>,
    pub changed: bool,
}

/// Live text of the element under inline edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUpdate {
    pub text: String,
    pub metadata: Option<Identity>,
}

/// Agent → host events
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Ready(ReadyPayload),
    ModeChanged(EditMode),
    SelectionChanged(Option<ElementDescriptor>),
    HoverChanged(Option<ElementDescriptor>),
    InlineEditStarted(ElementDescriptor),
    InlineEditEnded(InlineEditOutcome),
    TextUpdated(TextUpdate),
    OpenEditUi(ElementDescriptor),
    SelectionCleared,
}

impl Outbound {
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Ready(_) => "READY",
            Outbound::ModeChanged(_) => "EDIT_MODE_STATE",
            Outbound::SelectionChanged(_) => "ELEMENT_CLICKED",
            Outbound::HoverChanged(_) => "ELEMENT_HOVERED",
            Outbound::InlineEditStarted(_) | Outbound::InlineEditEnded(_) => "INLINE_EDIT_STATE",
            Outbound::TextUpdated(_) => "ELEMENT_TEXT_UPDATED",
            Outbound::OpenEditUi(_) => "OPEN_EDITOR_POPOVER",
            Outbound::SelectionCleared => "SELECTION_CLEARED",
        }
    }

    pub fn payload(&self) -> ProtocolResult<Value> {
        let value = match self {
            Outbound::Ready(ready) => serde_json::to_value(ready)?,
            Outbound::ModeChanged(state) => serde_json::json!({ "state": state }),
            Outbound::SelectionChanged(descriptor) | Outbound::HoverChanged(descriptor) => {
                serde_json::to_value(descriptor)?
            }
            Outbound::InlineEditStarted(descriptor) => {
                let mut value = serde_json::to_value(descriptor)?;
                if let Value::Object(ref mut fields) = value {
                    fields.insert("state".to_string(), serde_json::to_value(InlineEditState::Started)?);
                }
                value
            }
            Outbound::InlineEditEnded(outcome) => serde_json::to_value(outcome)?,
            Outbound::TextUpdated(update) => serde_json::to_value(update)?,
            Outbound::OpenEditUi(descriptor) => serde_json::to_value(descriptor)?,
            Outbound::SelectionCleared => Value::Object(Map::new()),
        };
        Ok(value)
    }
}

/// Class list edit requested by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassChanges {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

/// Host → agent commands
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    SetState(EditMode),
    UpdateText(String),
    UpdateStyles(BTreeMap<String, String>),
    UpdateClasses(ClassChanges),
    DeleteElement,
    ClearSelection,
}

impl Inbound {
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::SetState(_) => "SET_STATE",
            Inbound::UpdateText(_) => "UPDATE_TEXT_CONTENT",
            Inbound::UpdateStyles(_) => "UPDATE_STYLES",
            Inbound::UpdateClasses(_) => "UPDATE_CLASSES",
            Inbound::DeleteElement => "DELETE_ELEMENT",
            Inbound::ClearSelection => "CLEAR_SELECTION",
        }
    }

    /// Decode a command from its wire type and raw payload.
    ///
    /// Unknown types are reported as [`ProtocolError::UnknownType`] so the
    /// caller can log and move on.
    pub fn decode(kind: &str, payload: &Value) -> ProtocolResult<Self> {
        match kind {
            "SET_STATE" => {
                let state = payload
                    .get("state")
                    .cloned()
                    .ok_or_else(|| ProtocolError::malformed(kind, "missing state"))?;
                let state: EditMode = serde_json::from_value(state)
                    .map_err(|e| ProtocolError::malformed(kind, e.to_string()))?;
                Ok(Inbound::SetState(state))
            }
            "UPDATE_TEXT_CONTENT" => match payload.get("text") {
                Some(Value::String(text)) => Ok(Inbound::UpdateText(text.clone())),
                _ => Err(ProtocolError::malformed(kind, "text must be a string")),
            },
            "UPDATE_STYLES" => {
                let Value::Object(fields) = payload else {
                    return Err(ProtocolError::malformed(kind, "styles must be an object"));
                };
                let styles = fields
                    .iter()
                    .filter_map(|(property, value)| {
                        style_value(value).map(|value| (property.clone(), value))
                    })
                    .collect();
                Ok(Inbound::UpdateStyles(styles))
            }
            "UPDATE_CLASSES" => {
                if !payload.is_object() {
                    return Err(ProtocolError::malformed(kind, "classes must be an object"));
                }
                Ok(Inbound::UpdateClasses(ClassChanges {
                    add: class_names(payload.get("add")),
                    remove: class_names(payload.get("remove")),
                }))
            }
            "DELETE_ELEMENT" => Ok(Inbound::DeleteElement),
            "CLEAR_SELECTION" => Ok(Inbound::ClearSelection),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

// Null entries are "leave as is"; numbers are stringified like a DOM style assignment would.
fn style_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn class_names(list: Option<&Value>) -> Vec<String> {
    match list {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
