//! Stored task data
//!
//! All saves share one record under [`TASKS_DATA_KEY`]:
//!
//! ```text
//! {
//!   "version": "1.2.0",
//!   "tasks": {
//!     "<save id>": { "<owner id>": [ { "kind": "buy", ... }, ... ] },
//!     "<legacy save id>": [ { "kind": "basic", ... } ]
//!   }
//! }
//! ```
//!
//! A save whose value is a flat array predates ownership tracking; its tasks
//! are decoded under owner `0` and remapped to the local player on load.
//! Encoding always writes the owner map and the current version.

mod error;

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::domain::PlayerId;
use crate::factory::TaskRegistry;
use crate::task::Task;

pub use error::DecodeError;

/// Data store key of the task record
pub const TASKS_DATA_KEY: &str = "tasks-data";

/// Version assumed for records without one
pub const BASELINE_FORMAT_VERSION: &str = "1.0.0";

pub const FORMAT_VERSION: &str = "1.2.0";

/// Tasks of one save, by owner
pub type SaveTasks = BTreeMap<PlayerId, Vec<Box<dyn Task>>>;

/// Decoded task record for every save
#[derive(Debug, Clone)]
pub struct TaskData {
    version: String,
    saves: BTreeMap<String, SaveTasks>,
}

impl Default for TaskData {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            saves: BTreeMap::new(),
        }
    }
}

impl TaskData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Version the record was read with
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn save(&self, save_id: &str) -> Option<&SaveTasks> {
        self.saves.get(save_id)
    }

    pub fn take_save(&mut self, save_id: &str) -> Option<SaveTasks> {
        self.saves.remove(save_id)
    }

    pub fn set_save(&mut self, save_id: impl Into<String>, tasks: SaveTasks) {
        self.saves.insert(save_id.into(), tasks);
    }

    pub fn save_ids(&self) -> impl Iterator<Item = &str> {
        self.saves.keys().map(String::as_str)
    }

    pub fn from_json(json: &str, registry: &TaskRegistry) -> Result<Self, DecodeError> {
        Self::decode(serde_json::from_str(json)?, registry)
    }

    /// Decode a stored record
    ///
    /// Any malformed part fails the whole decode.
    pub fn decode(value: Value, registry: &TaskRegistry) -> Result<Self, DecodeError> {
        let Value::Object(mut root) = value else {
            return Err(DecodeError::Malformed);
        };
        let version = match root.remove("version") {
            Some(Value::String(v)) => v,
            _ => BASELINE_FORMAT_VERSION.to_string(),
        };
        let Some(Value::Object(tasks)) = root.remove("tasks") else {
            return Err(DecodeError::Malformed);
        };

        let mut saves = BTreeMap::new();
        for (save, value) in tasks {
            let owners = match value {
                Value::Array(records) => {
                    debug!(%save, "TaskData::decode: legacy flat task list");
                    let mut owners = SaveTasks::new();
                    owners.insert(PlayerId::LEGACY, decode_records(&save, PlayerId::LEGACY, records, registry)?);
                    owners
                }
                Value::Object(map) => decode_owners(&save, map, registry)?,
                _ => return Err(DecodeError::InvalidSave { save }),
            };
            saves.insert(save, owners);
        }

        debug!(%version, saves = saves.len(), "TaskData::decode: decoded");
        Ok(Self { version, saves })
    }

    pub fn encode(&self) -> serde_json::Result<Value> {
        let mut tasks = Map::new();
        for (save, owners) in &self.saves {
            let mut by_owner = Map::new();
            for (owner, list) in owners {
                let records = list.iter().map(|t| t.to_record()).collect::<serde_json::Result<Vec<_>>>()?;
                by_owner.insert(owner.to_string(), Value::Array(records));
            }
            tasks.insert(save.clone(), Value::Object(by_owner));
        }
        Ok(json!({ "version": FORMAT_VERSION, "tasks": tasks }))
    }
}

fn decode_owners(save: &str, map: Map<String, Value>, registry: &TaskRegistry) -> Result<SaveTasks, DecodeError> {
    let mut owners = SaveTasks::new();
    for (key, value) in map {
        let owner: PlayerId = key.parse().map_err(|_| DecodeError::InvalidOwner {
            save: save.to_string(),
            key: key.clone(),
        })?;
        let Value::Array(records) = value else {
            return Err(DecodeError::InvalidOwnerTasks {
                save: save.to_string(),
                owner,
            });
        };
        let decoded = decode_records(save, owner, records, registry)?;
        owners.entry(owner).or_default().extend(decoded);
    }
    Ok(owners)
}

fn decode_records(
    save: &str,
    owner: PlayerId,
    records: Vec<Value>,
    registry: &TaskRegistry,
) -> Result<Vec<Box<dyn Task>>, DecodeError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let mut task = registry.decode(record).map_err(|source| DecodeError::Record {
                save: save.to_string(),
                owner,
                index,
                source: Box::new(source),
            })?;
            task.core_mut().owner_id = owner;
            Ok(task)
        })
        .collect()
}
