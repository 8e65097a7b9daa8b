use crate::pool::PoolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    GraphError(#[from] context_graph::GraphError),

    #[error("Extraction pool error: {0}")]
    PoolError(#[from] PoolError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
