//! Data store error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors from data store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid key '{0}': keys may only contain letters, digits, '.', '-' and '_'")]
    InvalidKey(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error came from the underlying filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
