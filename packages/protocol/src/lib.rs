//! # Live Edit Protocol
//!
//! Shared vocabulary between the source tagger, the in-page editor agent and
//! the host application that embeds the rendered document.
//!
//! ```text
//! ┌──────────────┐  data-sg-el="src/a.tsx:3:2"  ┌──────────────┐   Envelope   ┌──────────┐
//! │ tagger       │ ───────────────────────────▶ │ agent (page) │ ◀──────────▶ │ host     │
//! └──────────────┘                               └──────────────┘              └──────────┘
//! ```
//!
//! - [`identity`]: the `path:line:column` encoding burned into element attributes
//! - [`messages`]: closed enums for every inbound command and outbound event
//! - [`envelope`]: the wire envelope plus the trust checks applied to inbound traffic

pub mod envelope;
pub mod error;
pub mod identity;
pub mod messages;

pub use envelope::{Envelope, TrustPolicy, AGENT_SOURCE_TAG, HOST_SOURCE_TAG};
pub use error::{ProtocolError, ProtocolResult};
pub use identity::{Identity, IDENTITY_ATTR, NAME_ATTR};
pub use messages::{
    ClassChanges, EditMode, ElementDescriptor, Inbound, InlineEditOutcome, InlineEditState,
    Outbound, ReadyPayload, Rect, TextUpdate,
};
