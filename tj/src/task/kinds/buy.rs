use serde::{Deserialize, Serialize};

use super::{ITEM_COUNT_PARAMS, ItemCount};
use crate::catalog::Catalog;
use crate::events::{Channels, SalablePurchased};
use crate::factory::{FactoryError, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind};
use crate::task::{ItemMatcher, Task, TaskCore};

/// Buy a number of matching items from a shop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyTask {
    #[serde(flatten)]
    core: TaskCore,
    #[serde(default)]
    item_ids: Vec<String>,
    #[serde(skip)]
    matcher: ItemMatcher,
}

impl BuyTask {
    pub fn new(name: impl Into<String>, item_ids: Vec<String>, count: u32) -> Self {
        let mut task = Self {
            core: TaskCore::new(Self::KIND, name).with_max_count(count),
            item_ids,
            matcher: ItemMatcher::default(),
        };
        task.validate();
        task
    }

    /// Shop price of one unit
    pub fn with_unit_price(mut self, price: i64) -> Self {
        self.core.base_price = price;
        self
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }
}

impl Task for BuyTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn channels(&self) -> Channels {
        Channels::SALABLE_PURCHASED
    }

    fn validate(&mut self) {
        self.matcher = ItemMatcher::new(&self.item_ids);
    }

    fn show_progress(&self) -> bool {
        true
    }

    fn on_salable_purchased(&mut self, args: &SalablePurchased) {
        if self.accepts(args.actor) && self.matcher.matches(&args.salable) {
            self.increment_count(args.amount);
        }
    }
}

impl TaskKind for BuyTask {
    const KIND: &'static str = "buy";
    const ICONS: SmartIcons = SmartIcons::ITEM;
    type Factory = BuyFactory;
}

#[derive(Debug, Clone, Default)]
pub struct BuyFactory {
    fields: ItemCount,
}

impl TaskFactory for BuyFactory {
    fn kind(&self) -> &'static str {
        BuyTask::KIND
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
            .map_or(0, |info| info.price);
        let task = BuyTask::new(name, self.fields.items.clone(), self.fields.max_count()).with_unit_price(price);
        Some(Box::new(task))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)?;
        if let Some(buy) = task.as_any().downcast_ref::<BuyTask>() {
            self.fields.load(&buy.item_ids, buy.core.max_count);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::domain::{Item, PlayerId};

    fn purchased(actor: i64, id: &str, amount: u32) -> SalablePurchased {
        SalablePurchased {
            actor: PlayerId(actor),
            salable: Item::new(id, "seed"),
            amount,
        }
    }

    #[test]
    fn test_factory_readiness() {
        let catalog = StaticCatalog::builtin().unwrap();
        let mut factory = BuyFactory::default();
        assert_eq!(factory.get("count"), Some(ParamValue::Number(1)));
        assert!(!factory.is_ready(&catalog));
        assert!(factory.create("seeds", &catalog).is_none());

        factory
            .set("item", ParamValue::Items(vec!["(O)472".to_string()]))
            .unwrap();
        assert!(factory.is_ready(&catalog));

        let task = factory.create("seeds", &catalog).unwrap();
        assert_eq!(task.kind(), "buy");
        assert_eq!(task.core().max_count, 1);
        assert_eq!(task.core().base_price, 20);
    }

    #[test]
    fn test_factory_rejects_unknown_item_and_zero_count() {
        let catalog = StaticCatalog::builtin().unwrap();
        let mut factory = BuyFactory::default();
        factory.set_raw("item", "(O)99999").unwrap();
        assert!(!factory.is_ready(&catalog));

        factory.set_raw("item", "(O)472").unwrap();
        factory.set_raw("count", "0").unwrap();
        assert!(!factory.is_ready(&catalog));
        assert!(factory.set_raw("count", "lots").is_err());
    }

    #[test]
    fn test_price_tracks_remaining() {
        let mut task = BuyTask::new("seeds", vec!["(O)472".to_string()], 10).with_unit_price(20);
        task.core_mut().owner_id = PlayerId(1);
        assert_eq!(task.price(), 200);
        task.on_salable_purchased(&purchased(1, "(O)472", 4));
        assert_eq!(task.price(), 120);
    }

    #[test]
    fn test_purchase_guarded_by_owner() {
        let mut task = BuyTask::new("seeds", vec!["(O)472".to_string()], 10);
        task.core_mut().owner_id = PlayerId(1);
        task.on_salable_purchased(&purchased(2, "(O)472", 4));
        task.on_salable_purchased(&purchased(1, "(O)474", 4));
        assert_eq!(task.core().count, 0);
    }
}
