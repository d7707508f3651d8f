//! Built-in task kinds
//!
//! Each kind lives in its own file next to its factory. Kinds driven by an
//! item list and a target count share [`ItemCount`] for their factory state.

mod animal;
mod basic;
mod blacksmith;
mod build;
mod buy;
mod collect;
mod craft;
mod gift;
mod header;
mod sell;

pub use animal::{AnimalFactory, AnimalTask};
pub use basic::{BasicFactory, BasicTask};
pub use blacksmith::{BlacksmithFactory, BlacksmithTask, upgrade_fee};
pub use build::{BuildFactory, BuildTask};
pub use buy::{BuyFactory, BuyTask};
pub use collect::{CollectFactory, CollectTask};
pub use craft::{CraftFactory, CraftTask};
pub use gift::{GiftFactory, GiftTask};
pub use header::{HeaderFactory, HeaderTask};
pub use sell::{SellFactory, SellTask};

use crate::factory::{Constraint, FactoryError, ParamTag, ParamValue, TaskParameter, lookup};

pub const ITEM: &str = "item";
pub const COUNT: &str = "count";
pub const NPC: &str = "npc";
pub const BUILDING: &str = "building";
pub const COST: &str = "cost";
pub const TOOL: &str = "tool";
pub const LEVEL: &str = "level";
pub const ANIMAL: &str = "animal";

pub(crate) static ITEM_COUNT_PARAMS: [TaskParameter; 2] = [
    TaskParameter::new(ITEM, ParamTag::ItemList).constraints(Constraint::NOT_EMPTY.union(Constraint::ITEM_ID)),
    TaskParameter::new(COUNT, ParamTag::Count).constraints(Constraint::GE1),
];

/// Clamp an edited count into a valid `max_count`
pub(crate) fn to_max_count(count: Option<i64>) -> u32 {
    count.and_then(|n| u32::try_from(n).ok()).unwrap_or(1).max(1)
}

/// Factory state for kinds built from an item list and a count
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ItemCount {
    pub items: Vec<String>,
    pub count: Option<i64>,
}

impl Default for ItemCount {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: Some(1),
        }
    }
}

impl ItemCount {
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        match name {
            ITEM => Some(ParamValue::from_items(&self.items)),
            COUNT => Some(ParamValue::from_number(self.count)),
            _ => None,
        }
    }

    pub fn set(&mut self, kind: &'static str, name: &str, value: ParamValue) -> Result<(), FactoryError> {
        let param = lookup(kind, &ITEM_COUNT_PARAMS, name)?;
        match name {
            ITEM => self.items = value.into_items(param)?,
            _ => self.count = value.into_number(param)?,
        }
        Ok(())
    }

    pub fn load(&mut self, items: &[String], max_count: u32) {
        self.items = items.to_vec();
        self.count = Some(i64::from(max_count));
    }

    pub fn max_count(&self) -> u32 {
        to_max_count(self.count)
    }

    /// Base id of the first listed item, used for pricing
    pub fn first_base(&self) -> Option<&str> {
        self.items.first().map(|id| crate::task::split_flavored(id).0)
    }
}
