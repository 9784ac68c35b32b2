//! Interaction state owned by the agent

use crate::session::InlineEditSession;
use liveedit_protocol::EditMode;

/// The selected element and its `style` attribute at selection time.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<N> {
    pub element: N,
    /// `None` when the element had no `style` attribute
    pub original_style: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentState<N> {
    pub mode: EditMode,
    pub selection: Option<Selection<N>>,
    pub hover: Option<N>,
    pub session: Option<InlineEditSession<N>>,

    /// Document listeners are registered
    pub listening: bool,

    /// READY has been posted
    pub ready_sent: bool,
}

impl<N: PartialEq> AgentState<N> {
    pub fn new() -> Self {
        Self {
            mode: EditMode::Disabled,
            selection: None,
            hover: None,
            session: None,
            listening: false,
            ready_sent: false,
        }
    }

    pub fn selected(&self) -> Option<&N> {
        self.selection.as_ref().map(|selection| &selection.element)
    }

    pub fn editing(&self) -> Option<&N> {
        self.session.as_ref().map(|session| &session.element)
    }

    pub fn is_selected(&self, node: &N) -> bool {
        self.selected() == Some(node)
    }

    pub fn is_editing(&self, node: &N) -> bool {
        self.editing() == Some(node)
    }
}

impl<N: PartialEq> Default for AgentState<N> {
    fn default() -> Self {
        Self::new()
    }
}
