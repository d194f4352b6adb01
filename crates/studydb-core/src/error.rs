use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Index, model or corpus files are missing or unreadable.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every retrieval signal failed for a query.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Rerank failed: {0}")]
    Rerank(String),
}

pub type Result<T> = std::result::Result<T, Error>;
