//! Element identity scheme
//!
//! An identity names one source-level element instance as
//! `relativePath:line:column` (line 1-based, column 0-based). The tagger
//! writes it into [`IDENTITY_ATTR`]; the agent reads it back from the live
//! document. A value that does not match the format is simply "no identity".

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attribute carrying the encoded identity.
pub const IDENTITY_ATTR: &str = "data-sg-el";

/// Attribute carrying the optional human-readable element name.
pub const NAME_ATTR: &str = "data-sg-name";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// The attribute value exactly as found on the element
    #[serde(rename = "id")]
    pub raw: String,
    pub file_path: String,
    pub line: u32,
    pub column: u32,
}

impl Identity {
    pub fn new(file_path: impl Into<String>, line: u32, column: u32) -> Self {
        let file_path = file_path.into();
        Self {
            raw: Self::encode(&file_path, line, column),
            file_path,
            line,
            column,
        }
    }

    pub fn encode(file_path: &str, line: u32, column: u32) -> String {
        format!("{}:{}:{}", file_path, line, column)
    }

    /// Decode an attribute value.
    ///
    /// The path is everything before the last two `:`-separated fields, so
    /// Windows drive letters and other colons in paths survive.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.rsplitn(3, ':');
        let column = parse_digits(parts.next()?)?;
        let line = parse_digits(parts.next()?)?;
        let file_path = parts.next()?;
        if file_path.is_empty() {
            return None;
        }

        Some(Self {
            raw: raw.to_string(),
            file_path: file_path.to_string(),
            line,
            column,
        })
    }

    /// Re-encode from the decoded fields.
    pub fn to_encoded(&self) -> String {
        Self::encode(&self.file_path, self.line, self.column)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_digits(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Identity {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ProtocolError::InvalidIdentity(s.to_string()))
    }
}
