use serde::{Deserialize, Serialize};

use super::{ITEM_COUNT_PARAMS, ItemCount};
use crate::catalog::Catalog;
use crate::events::{Channels, ItemReceived};
use crate::factory::{FactoryError, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind};
use crate::task::{ItemMatcher, Task, TaskCore};

/// Craft or cook a number of matching items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftTask {
    #[serde(flatten)]
    core: TaskCore,
    #[serde(default)]
    item_ids: Vec<String>,
    #[serde(skip)]
    matcher: ItemMatcher,
}

impl CraftTask {
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

impl Task for CraftTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn channels(&self) -> Channels {
        Channels::ITEM_CRAFTED
    }

    fn validate(&mut self) {
        self.matcher = ItemMatcher::new(&self.item_ids);
    }

    fn show_progress(&self) -> bool {
        self.core.max_count > 1
    }

    fn on_item_crafted(&mut self, args: &ItemReceived) {
        if self.accepts(args.actor) && self.matcher.matches(&args.item) {
            self.increment_count(args.count);
        }
    }
}

impl TaskKind for CraftTask {
    const KIND: &'static str = "craft";
    const ICONS: SmartIcons = SmartIcons::ITEM;
    type Factory = CraftFactory;
}

#[derive(Debug, Clone, Default)]
pub struct CraftFactory {
    fields: ItemCount,
}

impl TaskFactory for CraftFactory {
    fn kind(&self) -> &'static str {
        CraftTask::KIND
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
        Some(Box::new(CraftTask::new(
            name,
            self.fields.items.clone(),
            self.fields.max_count(),
        )))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)?;
        if let Some(craft) = task.as_any().downcast_ref::<CraftTask>() {
            self.fields.load(&craft.item_ids, craft.core.max_count);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Item, PlayerId};

    #[test]
    fn test_craft_listens_only_to_crafting() {
        let mut task = CraftTask::new("furnaces", vec!["(BC)13".to_string()], 2);
        task.core_mut().owner_id = PlayerId(1);
        assert_eq!(task.channels(), Channels::ITEM_CRAFTED);

        let furnace = ItemReceived {
            actor: PlayerId(1),
            item: Item::new("(BC)13", "Furnace"),
            count: 1,
        };
        task.on_item_collected(&furnace);
        assert_eq!(task.core().count, 0);
        task.on_item_crafted(&furnace);
        task.on_item_crafted(&furnace);
        assert!(task.complete());
    }

    #[test]
    fn test_other_player_crafting_ignored() {
        let mut task = CraftTask::new("furnaces", vec!["(BC)13".to_string()], 1);
        task.core_mut().owner_id = PlayerId(1);
        task.on_item_crafted(&ItemReceived {
            actor: PlayerId(3),
            item: Item::new("(BC)13", "Furnace"),
            count: 4,
        });
        assert_eq!(task.core().count, 0);
        assert!(!task.complete());
    }
}
