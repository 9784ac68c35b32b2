//! # Inline-edit session
//!
//! At most one element is content-editable at a time. The session remembers
//! the text the element had when editing began so a cancel can put it back
//! verbatim.

use liveedit_protocol::{Identity, InlineEditOutcome, InlineEditState};

#[derive(Debug, Clone, PartialEq)]
pub struct InlineEditSession<N> {
    /// Element made content-editable
    pub element: N,

    /// Raw text content when the session started
    pub original_text: String,

    pub identity: Option<Identity>,
}

impl<N> InlineEditSession<N> {
    pub fn new(element: N, original_text: String, identity: Option<Identity>) -> Self {
        Self {
            element,
            original_text,
            identity,
        }
    }

    /// Final event for a session ending with `current_text` in the element.
    ///
    /// Only a commit with different text counts as saved; everything else
    /// reports the original text as cancelled.
    pub fn outcome(&self, current_text: &str, commit: bool) -> InlineEditOutcome {
        let changed = commit && current_text != self.original_text;
        InlineEditOutcome {
            state: if changed {
                InlineEditState::Saved
            } else {
                InlineEditState::Cancelled
            },
            text: if changed {
                current_text.to_string()
            } else {
                self.original_text.clone()
            },
            original_text: self.original_text.clone(),
            metadata: self.identity.clone(),
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> InlineEditSession<u32> {
        InlineEditSession::new(1, "Hi".to_string(), Identity::parse("a.tsx:1:0"))
    }

    #[test]
    fn test_commit_with_new_text_is_saved() {
        let outcome = session().outcome("Hello", true);
        assert_eq!(outcome.state, InlineEditState::Saved);
        assert_eq!(outcome.text, "Hello");
        assert_eq!(outcome.original_text, "Hi");
        assert!(outcome.changed);
        assert_eq!(outcome.metadata.unwrap().as_str(), "a.tsx:1:0");
    }

    #[test]
    fn test_commit_with_same_text_is_unchanged() {
        let outcome = session().outcome("Hi", true);
        assert_eq!(outcome.state, InlineEditState::Cancelled);
        assert!(!outcome.changed);
    }

    #[test]
    fn test_cancel_reports_original_text() {
        let outcome = session().outcome("Hello", false);
        assert_eq!(outcome.state, InlineEditState::Cancelled);
        assert_eq!(outcome.text, "Hi");
        assert!(!outcome.changed);
    }
}
