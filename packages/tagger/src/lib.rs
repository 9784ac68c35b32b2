//! # Live Edit Tagger
//!
//! Build-time transform that stamps every eligible JSX element with the
//! location it was written at:
//!
//! ```text
//! <Button onClick={go}>            <Button data-sg-el="src/a.tsx:3:2" data-sg-name="Button" onClick={go}>
//! ```
//!
//! The transform is fail-open: whatever goes wrong, the caller gets valid
//! source back (the original text in the worst case), so a tagging bug can
//! never break a build.

mod edits;
mod error;
mod options;
mod source_map;
mod tagger;

pub use edits::{EditList, Insertion};
pub use error::{TagError, TagResult};
pub use options::{relative_path, BuildMode, TaggerOptions, DEFAULT_EXCLUDED_ELEMENTS};
pub use source_map::{build_source_map, utf16_column};
pub use tagger::{tag, TagReport, TagStatus, Tagger};
