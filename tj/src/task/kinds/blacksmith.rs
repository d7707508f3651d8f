use serde::{Deserialize, Serialize};

use super::{LEVEL, TOOL};
use crate::catalog::Catalog;
use crate::events::{Channels, InventoryChanged, SalablePurchased};
use crate::factory::{
    Constraint, FactoryError, ParamTag, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind,
    lookup,
};
use crate::task::{Task, TaskCore};

/// Fee charged by the blacksmith for upgrading a tool to `level`
pub fn upgrade_fee(level: u8) -> i64 {
    match level {
        1 => 2_000,
        2 => 5_000,
        3 => 10_000,
        4 => 25_000,
        _ => 0,
    }
}

/// Get a tool upgraded
///
/// Count 0 means the tool still has to be delivered, 1 means it is at the
/// blacksmith. The task completes once the tool comes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacksmithTask {
    #[serde(flatten)]
    core: TaskCore,
    tool_name: String,
    #[serde(default = "default_level")]
    upgrade_level: u8,
}

fn default_level() -> u8 {
    1
}

impl BlacksmithTask {
    pub fn new(name: impl Into<String>, tool_name: impl Into<String>, upgrade_level: u8) -> Self {
        Self {
            core: TaskCore::new(Self::KIND, name).with_max_count(2),
            tool_name: tool_name.into(),
            upgrade_level,
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn upgrade_level(&self) -> u8 {
        self.upgrade_level
    }

    pub fn delivered(&self) -> bool {
        self.core.count >= 1
    }
}

impl Task for BlacksmithTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn channels(&self) -> Channels {
        Channels::SALABLE_PURCHASED | Channels::INVENTORY_CHANGED
    }

    fn validate(&mut self) {
        self.core.max_count = 2;
    }

    fn price(&self) -> i64 {
        if self.core.count == 0 {
            upgrade_fee(self.upgrade_level)
        } else {
            0
        }
    }

    fn on_salable_purchased(&mut self, args: &SalablePurchased) {
        if self.accepts(args.actor)
            && self.core.count == 0
            && args.salable.is_tool()
            && args.salable.base_name == self.tool_name
        {
            self.core.count = 1;
        }
    }

    fn on_inventory_changed(&mut self, args: &InventoryChanged) {
        if self.accepts(args.actor)
            && args.tool_being_upgraded.is_none()
            && self.core.count == 1
            && args
                .added
                .iter()
                .any(|item| item.is_tool() && item.base_name == self.tool_name)
        {
            self.mark_as_completed();
        }
    }
}

impl TaskKind for BlacksmithTask {
    const KIND: &'static str = "blacksmith";
    const ICONS: SmartIcons = SmartIcons::ITEM;
    type Factory = BlacksmithFactory;
}

static PARAMS: [TaskParameter; 2] = [
    TaskParameter::new(TOOL, ParamTag::Tool).constraints(Constraint::NOT_EMPTY.union(Constraint::TOOL)),
    TaskParameter::new(LEVEL, ParamTag::Count)
        .constraints(Constraint::GE1)
        .optional()
        .hidden(),
];

#[derive(Debug, Clone)]
pub struct BlacksmithFactory {
    tool: String,
    level: Option<i64>,
}

impl Default for BlacksmithFactory {
    fn default() -> Self {
        Self {
            tool: String::new(),
            level: Some(1),
        }
    }
}

impl TaskFactory for BlacksmithFactory {
    fn kind(&self) -> &'static str {
        BlacksmithTask::KIND
    }

    fn parameters(&self) -> &'static [TaskParameter] {
        &PARAMS
    }

    fn get(&self, name: &str) -> Option<ParamValue> {
        match name {
            TOOL => Some(ParamValue::from_text(&self.tool)),
            LEVEL => Some(ParamValue::from_number(self.level)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: ParamValue) -> Result<(), FactoryError> {
        let param = lookup(self.kind(), &PARAMS, name)?;
        match name {
            TOOL => self.tool = value.into_text(param)?,
            _ => self.level = value.into_number(param)?,
        }
        Ok(())
    }

    fn build(&self, name: &str, _catalog: &dyn Catalog) -> Option<Box<dyn Task>> {
        let level = self.level.and_then(|l| u8::try_from(l).ok()).unwrap_or(1).clamp(1, 4);
        Some(Box::new(BlacksmithTask::new(name, self.tool.clone(), level)))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)?;
        if let Some(smith) = task.as_any().downcast_ref::<BlacksmithTask>() {
            self.tool = smith.tool_name.clone();
            self.level = Some(i64::from(smith.upgrade_level));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::domain::{Item, PlayerId};

    fn axe_task() -> BlacksmithTask {
        let mut task = BlacksmithTask::new("copper axe", "Axe", 1);
        task.core_mut().owner_id = PlayerId(1);
        task
    }

    fn bought(actor: i64, item: Item) -> SalablePurchased {
        SalablePurchased {
            actor: PlayerId(actor),
            salable: item,
            amount: 1,
        }
    }

    fn returned(actor: i64, added: Vec<Item>, upgrading: Option<&str>) -> InventoryChanged {
        InventoryChanged {
            actor: PlayerId(actor),
            added,
            tool_being_upgraded: upgrading.map(str::to_string),
        }
    }

    #[test]
    fn test_upgrade_flow() {
        let mut task = axe_task();
        assert_eq!(task.price(), 2000);

        task.on_salable_purchased(&bought(1, Item::tool("Hoe")));
        assert!(!task.delivered());

        task.on_salable_purchased(&bought(1, Item::tool("Axe")));
        assert!(task.delivered());
        assert_eq!(task.price(), 0);

        task.on_inventory_changed(&returned(1, vec![Item::tool("Axe")], Some("Axe")));
        assert!(!task.complete());

        task.on_inventory_changed(&returned(1, vec![Item::tool("Axe")], None));
        assert!(task.complete());
        assert_eq!(task.core().count, 2);
    }

    #[test]
    fn test_return_before_delivery_ignored() {
        let mut task = axe_task();
        task.on_inventory_changed(&returned(1, vec![Item::tool("Axe")], None));
        assert!(!task.complete());
        assert_eq!(task.core().count, 0);
    }

    #[test]
    fn test_other_player_delivery_ignored() {
        let mut task = axe_task();
        task.on_salable_purchased(&bought(2, Item::tool("Axe")));
        assert!(!task.delivered());
    }

    #[test]
    fn test_other_player_pickup_ignored() {
        let mut task = axe_task();
        task.on_salable_purchased(&bought(1, Item::tool("Axe")));
        task.on_inventory_changed(&returned(2, vec![Item::tool("Axe")], None));
        assert!(!task.complete());
        assert_eq!(task.core().count, 1);
    }

    #[test]
    fn test_non_tool_with_same_name_ignored() {
        let mut task = axe_task();
        task.on_salable_purchased(&bought(1, Item::new("(O)999", "Axe")));
        assert!(!task.delivered());
    }

    #[test]
    fn test_upgrade_fee_table() {
        assert_eq!(upgrade_fee(2), 5000);
        assert_eq!(upgrade_fee(4), 25000);
        assert_eq!(upgrade_fee(9), 0);
    }

    #[test]
    fn test_factory_hidden_level_not_validated() {
        let catalog = StaticCatalog::builtin().unwrap();
        let mut factory = BlacksmithFactory::default();
        factory.set_raw("tool", "Pickaxe").unwrap();
        factory.set("level", ParamValue::Number(0)).unwrap();
        assert!(factory.is_ready(&catalog));

        factory.set("level", ParamValue::Number(3)).unwrap();
        let task = factory.create("gold pickaxe", &catalog).unwrap();
        assert_eq!(task.price(), 10000);
        assert_eq!(task.core().max_count, 2);

        factory.set_raw("tool", "Fishing Rod").unwrap();
        assert!(!factory.is_ready(&catalog));
    }
}
