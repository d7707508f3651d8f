use serde::{Deserialize, Serialize};

use super::{ITEM, NPC};
use crate::catalog::Catalog;
use crate::events::{Channels, ItemGifted};
use crate::factory::{
    Constraint, FactoryError, ParamTag, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind,
    lookup,
};
use crate::task::{ItemMatcher, Task, TaskCore};

/// Give an NPC a gift, optionally restricted to certain items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftTask {
    #[serde(flatten)]
    core: TaskCore,
    npc: String,
    /// Empty means any item
    #[serde(default)]
    item_ids: Vec<String>,
    #[serde(skip)]
    matcher: ItemMatcher,
}

impl GiftTask {
    pub fn new(name: impl Into<String>, npc: impl Into<String>, item_ids: Vec<String>) -> Self {
        let mut task = Self {
            core: TaskCore::new(Self::KIND, name),
            npc: npc.into(),
            item_ids,
            matcher: ItemMatcher::default(),
        };
        task.validate();
        task
    }

    pub fn npc(&self) -> &str {
        &self.npc
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }
}

impl Task for GiftTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn channels(&self) -> Channels {
        Channels::ITEM_GIFTED
    }

    fn validate(&mut self) {
        self.matcher = ItemMatcher::new(&self.item_ids);
    }

    fn on_item_gifted(&mut self, args: &ItemGifted) {
        if self.accepts(args.actor)
            && self.npc == args.npc
            && (self.matcher.is_empty() || self.matcher.matches(&args.item))
        {
            self.mark_as_completed();
        }
    }
}

impl TaskKind for GiftTask {
    const KIND: &'static str = "gift";
    const ICONS: SmartIcons = SmartIcons::ITEM.union(SmartIcons::NPC);
    type Factory = GiftFactory;
}

static PARAMS: [TaskParameter; 2] = [
    TaskParameter::new(NPC, ParamTag::NpcName).constraints(Constraint::NOT_EMPTY.union(Constraint::NPC)),
    TaskParameter::new(ITEM, ParamTag::ItemList)
        .constraints(Constraint::SOBJECT)
        .optional(),
];

#[derive(Debug, Clone, Default)]
pub struct GiftFactory {
    npc: String,
    items: Vec<String>,
}

impl TaskFactory for GiftFactory {
    fn kind(&self) -> &'static str {
        GiftTask::KIND
    }

    fn parameters(&self) -> &'static [TaskParameter] {
        &PARAMS
    }

    fn get(&self, name: &str) -> Option<ParamValue> {
        match name {
            NPC => Some(ParamValue::from_text(&self.npc)),
            ITEM => Some(ParamValue::from_items(&self.items)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: ParamValue) -> Result<(), FactoryError> {
        let param = lookup(self.kind(), &PARAMS, name)?;
        match name {
            NPC => self.npc = value.into_text(param)?,
            _ => self.items = value.into_items(param)?,
        }
        Ok(())
    }

    fn build(&self, name: &str, _catalog: &dyn Catalog) -> Option<Box<dyn Task>> {
        Some(Box::new(GiftTask::new(name, self.npc.clone(), self.items.clone())))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)?;
        if let Some(gift) = task.as_any().downcast_ref::<GiftTask>() {
            self.npc = gift.npc.clone();
            self.items = gift.item_ids.clone();
        }
        Ok(())
    }
}
