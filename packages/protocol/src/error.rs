use thiserror::Error;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Message is not an envelope object")]
    NotAnEnvelope,

    #[error("Message source tag {found:?} does not match {expected:?}")]
    ForeignSource {
        expected: String,
        found: Option<String>,
    },

    #[error("Message was not sent by the parent context")]
    UntrustedSender,

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Malformed {kind} payload: {message}")]
    MalformedPayload { kind: String, message: String },

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProtocolError {
    pub fn malformed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Untrusted or foreign traffic is dropped without a diagnostic.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            ProtocolError::NotAnEnvelope
                | ProtocolError::ForeignSource { .. }
                | ProtocolError::UntrustedSender
        )
    }
}
