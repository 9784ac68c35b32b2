//! Error types for the agent

use thiserror::Error;

pub type DomResult<T> = Result<T, DomError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Node is no longer in the document")]
    Detached,

    #[error("DOM operation failed: {0}")]
    Operation(String),
}

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("No parent context to post to")]
    NoParent,

    #[error("Failed to encode message: {0}")]
    Encode(#[from] liveedit_protocol::ProtocolError),

    #[error("postMessage failed: {0}")]
    Post(String),
}
