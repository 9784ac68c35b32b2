use thiserror::Error;

pub type TagResult<T> = Result<T, TagError>;

#[derive(Error, Debug, Clone)]
pub enum TagError {
    #[error("Grammar could not be loaded: {0}")]
    Language(String),

    #[error("Source could not be parsed")]
    Parse,

    #[error("Syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("Invalid location at byte {offset}")]
    InvalidLocation { offset: usize },

    #[error("Element name is not valid UTF-8 at byte {offset}")]
    InvalidName { offset: usize },

    #[error("Insertion offset {offset} is outside the source ({len} bytes)")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("Source map error: {0}")]
    SourceMap(String),
}

impl TagError {
    pub fn invalid_location(offset: usize) -> Self {
        Self::InvalidLocation { offset }
    }
}
