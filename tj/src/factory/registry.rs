//! Kind registration table

use std::collections::HashMap;

use bitflags::bitflags;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{FactoryError, TaskFactory, TaskParameter};
use crate::persistence::DecodeError;
use crate::task::Task;
use crate::task::kinds::{
    AnimalTask, BasicTask, BlacksmithTask, BuildTask, BuyTask, CollectTask, CraftTask, GiftTask, HeaderTask,
    SellTask,
};

bitflags! {
    /// Which parameters an editor may derive an icon from
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SmartIcons: u8 {
        const ITEM = 1 << 0;
        const BUILDING = 1 << 2;
        const ANIMAL = 1 << 3;
        const NPC = 1 << 4;
    }
}

/// A concrete task type that can be registered
pub trait TaskKind: Task + Clone + Serialize + DeserializeOwned + 'static {
    /// Tag stored in the `kind` field of every record
    const KIND: &'static str;

    const ICONS: SmartIcons;

    type Factory: TaskFactory + Default + 'static;
}

/// Registration data for one kind
#[derive(Clone)]
pub struct KindEntry {
    pub kind: &'static str,
    pub icons: SmartIcons,
    pub parameters: &'static [TaskParameter],
    decode: fn(Value) -> serde_json::Result<Box<dyn Task>>,
    factory: fn() -> Box<dyn TaskFactory>,
}

impl KindEntry {
    fn of<K: TaskKind>() -> Self {
        Self {
            kind: K::KIND,
            icons: K::ICONS,
            parameters: K::Factory::default().parameters(),
            decode: decode_as::<K>,
            factory: new_factory::<K>,
        }
    }

    /// A fresh factory for this kind
    pub fn factory(&self) -> Box<dyn TaskFactory> {
        (self.factory)()
    }
}

impl std::fmt::Debug for KindEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindEntry")
            .field("kind", &self.kind)
            .field("icons", &self.icons)
            .field("parameters", &self.parameters.len())
            .finish()
    }
}

fn decode_as<K: TaskKind>(value: Value) -> serde_json::Result<Box<dyn Task>> {
    let mut task: K = serde_json::from_value(value)?;
    task.core_mut().normalize();
    task.validate();
    Ok(Box::new(task))
}

fn new_factory<K: TaskKind>() -> Box<dyn TaskFactory> {
    Box::new(K::Factory::default())
}

/// Task kinds known to this session, in registration order
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    entries: Vec<KindEntry>,
    index: HashMap<&'static str, usize>,
}

impl TaskRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind
    pub fn builtin() -> Self {
        debug!("TaskRegistry::builtin: called");
        let mut registry = Self::empty();
        registry.register::<BasicTask>();
        registry.register::<HeaderTask>();
        registry.register::<CollectTask>();
        registry.register::<CraftTask>();
        registry.register::<BuyTask>();
        registry.register::<SellTask>();
        registry.register::<GiftTask>();
        registry.register::<BuildTask>();
        registry.register::<BlacksmithTask>();
        registry.register::<AnimalTask>();
        registry
    }

    /// Add `K`, replacing an earlier registration with the same tag
    pub fn register<K: TaskKind>(&mut self) -> &mut Self {
        let entry = KindEntry::of::<K>();
        debug!(kind = entry.kind, params = entry.parameters.len(), "TaskRegistry::register");
        match self.index.get(entry.kind) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.kind, self.entries.len());
                self.entries.push(entry);
            }
        }
        self
    }

    pub fn get(&self, kind: &str) -> Option<&KindEntry> {
        self.index.get(kind).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.index.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &KindEntry> {
        self.entries.iter()
    }

    pub fn factory(&self, kind: &str) -> Result<Box<dyn TaskFactory>, FactoryError> {
        self.get(kind)
            .map(KindEntry::factory)
            .ok_or_else(|| FactoryError::UnknownKind(kind.to_string()))
    }

    /// Decode one stored record
    ///
    /// The `kind` tag is read first and selects the decoder for the rest of
    /// the record.
    pub fn decode(&self, record: Value) -> Result<Box<dyn Task>, DecodeError> {
        let kind = record
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingKind)?
            .to_string();
        let entry = self.get(&kind).ok_or_else(|| DecodeError::UnknownKind(kind.clone()))?;
        (entry.decode)(record).map_err(|source| DecodeError::InvalidRecord { kind, source })
    }
}
