//! Batched insertions against an immutable original text.
//!
//! Every [`Insertion`] records an offset into the *original* source. Nothing
//! is spliced until [`EditList::apply`], which walks the original once, so
//! recording N insertions can never shift the offset of the N+1th.

use crate::error::{TagError, TagResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Byte offset into the original source
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct EditList {
    insertions: Vec<Insertion>,
}

impl EditList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.insertions.push(Insertion {
            offset,
            text: text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.insertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }

    /// Insertions ordered by offset; ties keep recording order.
    pub fn sorted(&self) -> Vec<&Insertion> {
        let mut sorted: Vec<&Insertion> = self.insertions.iter().collect();
        sorted.sort_by_key(|insertion| insertion.offset);
        sorted
    }

    /// Reject offsets that are past the end or split a UTF-8 sequence.
    pub fn validate(&self, original: &str) -> TagResult<()> {
        for insertion in &self.insertions {
            if insertion.offset > original.len() || !original.is_char_boundary(insertion.offset) {
                return Err(TagError::OffsetOutOfBounds {
                    offset: insertion.offset,
                    len: original.len(),
                });
            }
        }
        Ok(())
    }

    pub fn apply(&self, original: &str) -> TagResult<String> {
        self.validate(original)?;

        let extra: usize = self.insertions.iter().map(|i| i.text.len()).sum();
        let mut output = String::with_capacity(original.len() + extra);
        let mut cursor = 0;

        for insertion in self.sorted() {
            output.push_str(&original[cursor..insertion.offset]);
            output.push_str(&insertion.text);
            cursor = insertion.offset;
        }
        output.push_str(&original[cursor..]);

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_refer_to_original() {
        let mut edits = EditList::new();
        edits.insert(4, " a=\"1\"");
        edits.insert(10, " b=\"2\"");

        let out = edits.apply("<div><span></span></div>").unwrap();
        assert_eq!(out, "<div a=\"1\"><span b=\"2\"></span></div>");
    }

    #[test]
    fn test_out_of_order_recording() {
        let mut edits = EditList::new();
        edits.insert(10, "B");
        edits.insert(2, "A");
        assert_eq!(edits.apply("0123456789").unwrap(), "01A23456789B");
    }

    #[test]
    fn test_same_offset_keeps_recording_order() {
        let mut edits = EditList::new();
        edits.insert(1, "x");
        edits.insert(1, "y");
        assert_eq!(edits.apply("ab").unwrap(), "axyb");
    }

    #[test]
    fn test_rejects_bad_offsets() {
        let mut edits = EditList::new();
        edits.insert(99, "x");
        assert!(matches!(
            edits.apply("short"),
            Err(TagError::OffsetOutOfBounds { offset: 99, len: 5 })
        ));

        let mut edits = EditList::new();
        edits.insert(1, "x");
        assert!(edits.apply("日本").is_err());
    }

    #[test]
    fn test_empty_list_is_identity() {
        let edits = EditList::new();
        assert!(edits.is_empty());
        assert_eq!(edits.apply("<a/>").unwrap(), "<a/>");
    }
}
