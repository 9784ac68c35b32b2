//! Wire envelope and inbound trust checks

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{Inbound, Outbound};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source tag the host stamps on its commands
pub const HOST_SOURCE_TAG: &str = "softgen-editor";

/// Source tag the agent stamps on its events
pub const AGENT_SOURCE_TAG: &str = "softgen-iframe";

/// `{type, payload, source}` as it travels over the cross-document channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, alias = "sourceTag", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Envelope {
    pub fn outbound(message: &Outbound, source: &str) -> ProtocolResult<Self> {
        Ok(Self {
            kind: message.kind().to_string(),
            payload: message.payload()?,
            source: Some(source.to_string()),
        })
    }

    /// Read an envelope out of arbitrary channel data.
    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        if !value.is_object() {
            return Err(ProtocolError::NotAnEnvelope);
        }
        serde_json::from_value(value).map_err(|_| ProtocolError::NotAnEnvelope)
    }

    pub fn to_value(&self) -> ProtocolResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decides which inbound traffic the agent acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    pub host_tag: String,
}

impl TrustPolicy {
    pub fn new(host_tag: impl Into<String>) -> Self {
        Self {
            host_tag: host_tag.into(),
        }
    }

    /// Check tag and sender, then decode the command.
    ///
    /// `from_parent` is the transport's answer to "was this posted by the
    /// embedding context?"; the envelope itself cannot prove that.
    pub fn admit(&self, data: Value, from_parent: bool) -> ProtocolResult<Inbound> {
        let envelope = Envelope::from_value(data)?;

        if envelope.source.as_deref() != Some(self.host_tag.as_str()) {
            return Err(ProtocolError::ForeignSource {
                expected: self.host_tag.clone(),
                found: envelope.source,
            });
        }

        if !from_parent {
            return Err(ProtocolError::UntrustedSender);
        }

        Inbound::decode(&envelope.kind, &envelope.payload)
    }
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self::new(HOST_SOURCE_TAG)
    }
}
