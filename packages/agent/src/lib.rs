//! # Live Edit Agent
//!
//! The runtime half of live editing. Embedded in the rendered page, it turns
//! elements carrying a `data-sg-el` identity into a hover / select /
//! inline-edit surface driven by a host application.
//!
//! ## Architecture
//!
//! ```text
//! browser events ──▶ ┌──────────────┐ ──▶ Channel ──▶ host
//!                    │ EditorAgent  │
//! host commands ───▶ │  AgentState  │ ──▶ Dom (web-sys or MemoryDom)
//!                    └──────────────┘
//! ```
//!
//! The agent is generic over [`Dom`] and [`Channel`], so the whole state
//! machine runs headless against [`MemoryDom`] and [`RecordingChannel`].

pub mod agent;
pub mod channel;
pub mod classify;
pub mod config;
pub mod descriptor;
pub mod dom;
pub mod error;
pub mod memory;
pub mod metadata;
pub mod overlay;
pub mod session;
pub mod state;

pub use agent::{CommandOutcome, EditorAgent};
pub use channel::{Channel, RecordingChannel};
pub use classify::{classify, extract_text, has_direct_text, Editability};
pub use config::AgentConfig;
pub use descriptor::{build_descriptor, STYLE_PROPERTIES};
pub use dom::{Dom, DocumentListener, DomEvent, ElementListener, EventResponse, NodeKey};
pub use error::{ChannelError, DomError, DomResult};
pub use memory::{MemoryDom, NodeId};
pub use metadata::{ElementMetadata, MetadataCache};
pub use session::InlineEditSession;
pub use state::{AgentState, Selection};
