//! Crate-level error type

use journalstore::StoreError;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::factory::FactoryError;
use crate::persistence::DecodeError;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to decode task data: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode task data: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("No save is loaded")]
    NoSession,

    #[error("No task at index {0}")]
    NoSuchTask(usize),
}

pub type Result<T> = std::result::Result<T, JournalError>;
