use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two nodes produced the same identifier. Signals a bug in the
    /// identifier scheme or an extractor, never a recoverable condition.
    #[error("Duplicate node identifier: {0}")]
    DuplicateIdentifier(String),

    /// A declaration arrived before (or without) the file node that owns it.
    #[error("Node {id} references unknown file {file_id}")]
    OrphanNode { id: String, file_id: String },
}
