use crate::overlay::EDIT_CURSOR;
use liveedit_protocol::{AGENT_SOURCE_TAG, HOST_SOURCE_TAG};
use serde::{Deserialize, Serialize};

/// Agent options, accepted from JS as a camelCase object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Source tag inbound commands must carry
    #[serde(default = "default_host_tag")]
    pub host_tag: String,

    /// Source tag stamped on outbound events
    #[serde(default = "default_agent_tag")]
    pub agent_tag: String,

    /// Pixels within which an element counts as full viewport width
    #[serde(default = "default_full_width_tolerance")]
    pub full_width_tolerance: f64,

    /// Body cursor while editing is on
    #[serde(default = "default_cursor")]
    pub cursor: String,
}

fn default_host_tag() -> String {
    HOST_SOURCE_TAG.to_string()
}

fn default_agent_tag() -> String {
    AGENT_SOURCE_TAG.to_string()
}

fn default_full_width_tolerance() -> f64 {
    4.0
}

fn default_cursor() -> String {
    EDIT_CURSOR.to_string()
}

impl AgentConfig {
    pub fn with_host_tag(mut self, host_tag: impl Into<String>) -> Self {
        self.host_tag = host_tag.into();
        self
    }

    pub fn with_agent_tag(mut self, agent_tag: impl Into<String>) -> Self {
        self.agent_tag = agent_tag.into();
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host_tag: default_host_tag(),
            agent_tag: default_agent_tag(),
            full_width_tolerance: default_full_width_tolerance(),
            cursor: default_cursor(),
        }
    }
}
