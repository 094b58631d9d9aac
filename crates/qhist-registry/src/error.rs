use std::io;
use std::path::{Path, PathBuf};

use qhist_types::QueryId;

/// Errors reported by a history source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The backing store cannot be reached.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// A stored record exists but cannot be decoded.
    #[error("corrupt record for {id}: {reason}")]
    Corrupt { id: QueryId, reason: String },

    /// I/O error from the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The instance configuration is missing a key or has a bad value.
    #[error("invalid configuration for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SourceError {
    /// Create an invalid-configuration error for `key`.
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for history source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from the history registry and manager.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// A factory with this name is already registered.
    #[error("query history source factory '{0}' is already registered")]
    DuplicateFactory(String),

    /// Required top-level configuration is missing or malformed.
    #[error("invalid history configuration {path:?}: {reason}")]
    Configuration { path: PathBuf, reason: String },

    /// A resolved factory failed to create its source.
    #[error("failed to create history source '{instance}' with factory '{factory}': {source}")]
    SourceCreation {
        instance: String,
        factory: String,
        #[source]
        source: SourceError,
    },

    /// A loaded source failed during lookup.
    #[error("history source '{instance}' failed: {source}")]
    Source {
        instance: String,
        #[source]
        source: SourceError,
    },
}

impl HistoryError {
    pub(crate) fn configuration(path: &Path, reason: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Result alias for registry operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
