use serde::{Deserialize, Serialize};

use super::{ITEM_COUNT_PARAMS, ItemCount};
use crate::catalog::Catalog;
use crate::events::{Channels, ItemReceived};
use crate::factory::{FactoryError, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind};
use crate::task::{ItemMatcher, Task, TaskCore};

/// Gather a number of matching items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectTask {
    #[serde(flatten)]
    core: TaskCore,
    #[serde(default)]
    item_ids: Vec<String>,
    #[serde(skip)]
    matcher: ItemMatcher,
}

impl CollectTask {
    pub fn new(name: impl Into<String>, item_ids: Vec<String>, count: u32) -> Self {
        let mut task = Self {
            core: TaskCore::new(Self::KIND, name).with_max_count(count),
            item_ids,
            matcher: ItemMatcher::default(),
        };
        task.validate();
        task
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }
}

impl Task for CollectTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn channels(&self) -> Channels {
        Channels::ITEM_COLLECTED
    }

    fn validate(&mut self) {
        self.matcher = ItemMatcher::new(&self.item_ids);
    }

    fn show_progress(&self) -> bool {
        self.core.max_count > 1
    }

    fn on_item_collected(&mut self, args: &ItemReceived) {
        if self.accepts(args.actor) && self.matcher.matches(&args.item) {
            self.increment_count(args.count);
        }
    }
}

impl TaskKind for CollectTask {
    const KIND: &'static str = "collect";
    const ICONS: SmartIcons = SmartIcons::ITEM;
    type Factory = CollectFactory;
}

#[derive(Debug, Clone, Default)]
pub struct CollectFactory {
    fields: ItemCount,
}

impl TaskFactory for CollectFactory {
    fn kind(&self) -> &'static str {
        CollectTask::KIND
    }

    fn parameters(&self) -> &'static [TaskParameter] {
        &ITEM_COUNT_PARAMS
    }

    fn get(&self, name: &str) -> Option<ParamValue> {
        self.fields.get(name)
    }

    fn set(&mut self, name: &str, value: ParamValue) -> Result<(), FactoryError> {
        self.fields.set(self.kind(), name, value)
    }

    fn build(&self, name: &str, _catalog: &dyn Catalog) -> Option<Box<dyn Task>> {
        Some(Box::new(CollectTask::new(
            name,
            self.fields.items.clone(),
            self.fields.max_count(),
        )))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)?;
        if let Some(collect) = task.as_any().downcast_ref::<CollectTask>() {
            self.fields.load(&collect.item_ids, collect.core.max_count);
        }
        Ok(())
    }
}
