//! JournalStore - keyed JSON data store
//!
//! Holds the global data blobs of the journal (tasks, notes, ...) under short
//! string keys. Each blob is an arbitrary JSON document; the owner of a key
//! decides its shape.
//!
//! # Layout
//!
//! ```text
//! {data_dir}/
//! ├── tasks-data.json
//! └── notes-data.json
//! ```
//!
//! # Example
//!
//! ```ignore
//! use journalstore::{DataStore, DataStoreExt, FileStore};
//!
//! let store = FileStore::open(journalstore::default_data_dir())?;
//! store.write("tasks-data", &serde_json::json!({ "version": "1.2.0" }))?;
//! let value = store.read("tasks-data")?;
//! ```

mod error;
mod store;

pub use error::StoreError;
pub use store::{DataStore, DataStoreExt, FileStore, MemoryStore};

/// File extension used for stored blobs
pub const BLOB_EXTENSION: &str = "json";

/// Default directory for the data store (~/.local/share/taskjournal on Linux)
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("taskjournal")
}
