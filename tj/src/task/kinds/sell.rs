use serde::{Deserialize, Serialize};

use super::{ITEM_COUNT_PARAMS, ItemCount};
use crate::catalog::Catalog;
use crate::events::{Channels, SalableSold};
use crate::factory::{FactoryError, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind};
use crate::task::{ItemMatcher, Task, TaskCore};

/// Sell a number of matching items; its price is money earned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellTask {
    #[serde(flatten)]
    core: TaskCore,
    #[serde(default)]
    item_ids: Vec<String>,
    #[serde(skip)]
    matcher: ItemMatcher,
}

impl SellTask {
    pub fn new(name: impl Into<String>, item_ids: Vec<String>, count: u32) -> Self {
        let mut task = Self {
            core: TaskCore::new(Self::KIND, name).with_max_count(count),
            item_ids,
            matcher: ItemMatcher::default(),
        };
        task.validate();
        task
    }

    /// What a shop pays for one unit; stored negated
    pub fn with_sell_price(mut self, price: i64) -> Self {
        self.core.base_price = -price.abs();
        self
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }
}

impl Task for SellTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn channels(&self) -> Channels {
        Channels::SALABLE_SOLD
    }

    fn validate(&mut self) {
        self.matcher = ItemMatcher::new(&self.item_ids);
    }

    fn show_progress(&self) -> bool {
        true
    }

    fn on_salable_sold(&mut self, args: &SalableSold) {
        if self.accepts(args.actor) && self.matcher.matches(&args.salable) {
            self.increment_count(args.amount);
        }
    }
}

impl TaskKind for SellTask {
    const KIND: &'static str = "sell";
    const ICONS: SmartIcons = SmartIcons::ITEM;
    type Factory = SellFactory;
}

#[derive(Debug, Clone, Default)]
pub struct SellFactory {
    fields: ItemCount,
}

impl TaskFactory for SellFactory {
    fn kind(&self) -> &'static str {
        SellTask::KIND
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

    fn build(&self, name: &str, catalog: &dyn Catalog) -> Option<Box<dyn Task>> {
        let price = self
            .fields
            .first_base()
            .and_then(|id| catalog.item(id))
            .map_or(0, |info| info.sell_price);
        let task = SellTask::new(name, self.fields.items.clone(), self.fields.max_count()).with_sell_price(price);
        Some(Box::new(task))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)?;
        if let Some(sell) = task.as_any().downcast_ref::<SellTask>() {
            self.fields.load(&sell.item_ids, sell.core.max_count);
        }
        Ok(())
    }
}
