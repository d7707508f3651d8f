//! Decode errors for stored task data

use thiserror::Error;

use crate::domain::PlayerId;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Task data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task data must be an object with a 'tasks' map")]
    Malformed,

    #[error("Tasks of save '{save}' must be an owner map or an array")]
    InvalidSave { save: String },

    #[error("Invalid owner id '{key}' in save '{save}'")]
    InvalidOwner { save: String, key: String },

    #[error("Tasks of owner {owner} in save '{save}' must be an array")]
    InvalidOwnerTasks { save: String, owner: PlayerId },

    #[error("Task record has no 'kind' tag")]
    MissingKind,

    #[error("Unknown task kind '{0}'")]
    UnknownKind(String),

    #[error("Invalid '{kind}' task record: {source}")]
    InvalidRecord {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Task {index} of owner {owner} in save '{save}': {source}")]
    Record {
        save: String,
        owner: PlayerId,
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },
}
