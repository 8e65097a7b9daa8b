use thiserror::Error;

/// Result type for extractor operations
pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Errors raised inside extraction. `extract` turns every one of them into a
/// diagnostic; they never reach the caller as `Err`.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// No extractor for the file's language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Grammar could not be loaded into the parser
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    /// Source text is not valid for the grammar
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    /// Parser gave up without producing a tree
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ExtractorError {
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}
