use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("query id must not be empty")]
    EmptyQueryId,

    #[error("unknown query state: {0}")]
    UnknownState(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
