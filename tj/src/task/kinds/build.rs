use serde::{Deserialize, Serialize};

use super::{BUILDING, COST, COUNT, to_max_count};
use crate::catalog::Catalog;
use crate::events::{BuildingConstructed, Channels};
use crate::factory::{
    Constraint, FactoryError, ParamTag, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind,
    lookup,
};
use crate::task::{Task, TaskCore};

const CABIN: &str = "Cabin";

/// Construct or upgrade to a building type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTask {
    #[serde(flatten)]
    core: TaskCore,
    building: String,
}

impl BuildTask {
    pub fn new(name: impl Into<String>, building: impl Into<String>, count: u32, cost: i64) -> Self {
        Self {
            core: TaskCore::new(Self::KIND, name)
                .with_max_count(count)
                .with_base_price(cost),
            building: building.into(),
        }
    }

    pub fn building(&self) -> &str {
        &self.building
    }

    fn matches(&self, args: &BuildingConstructed) -> bool {
        args.name_after_construction() == self.building || (self.building == CABIN && args.building.is_cabin)
    }
}

impl Task for BuildTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn channels(&self) -> Channels {
        Channels::BUILDING_CONSTRUCTED
    }

    fn show_progress(&self) -> bool {
        self.core.max_count > 1
    }

    fn on_building_constructed(&mut self, args: &BuildingConstructed) {
        if self.accepts(args.actor) && self.matches(args) {
            self.increment_count(1);
        }
    }
}

impl TaskKind for BuildTask {
    const KIND: &'static str = "build";
    const ICONS: SmartIcons = SmartIcons::BUILDING;
    type Factory = BuildFactory;
}

static PARAMS: [TaskParameter; 3] = [
    TaskParameter::new(BUILDING, ParamTag::Building).constraints(Constraint::NOT_EMPTY.union(Constraint::BUILDING)),
    TaskParameter::new(COUNT, ParamTag::Count).constraints(Constraint::GE1),
    TaskParameter::new(COST, ParamTag::Cost)
        .constraints(Constraint::GE0)
        .optional()
        .hidden(),
];

#[derive(Debug, Clone)]
pub struct BuildFactory {
    building: String,
    count: Option<i64>,
    /// Overrides the catalog cost when set
    cost: Option<i64>,
}

impl Default for BuildFactory {
    fn default() -> Self {
        Self {
            building: String::new(),
            count: Some(1),
            cost: None,
        }
    }
}

impl TaskFactory for BuildFactory {
    fn kind(&self) -> &'static str {
        BuildTask::KIND
    }

    fn parameters(&self) -> &'static [TaskParameter] {
        &PARAMS
    }

    fn get(&self, name: &str) -> Option<ParamValue> {
        match name {
            BUILDING => Some(ParamValue::from_text(&self.building)),
            COUNT => Some(ParamValue::from_number(self.count)),
            COST => Some(ParamValue::from_number(self.cost)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: ParamValue) -> Result<(), FactoryError> {
        let param = lookup(self.kind(), &PARAMS, name)?;
        match name {
            BUILDING => self.building = value.into_text(param)?,
            COUNT => self.count = value.into_number(param)?,
            _ => self.cost = value.into_number(param)?,
        }
        Ok(())
    }

    fn build(&self, name: &str, catalog: &dyn Catalog) -> Option<Box<dyn Task>> {
        let cost = self
            .cost
            .or_else(|| catalog.building(&self.building).map(|b| b.cost))
            .unwrap_or(0);
        Some(Box::new(BuildTask::new(
            name,
            self.building.clone(),
            to_max_count(self.count),
            cost,
        )))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)?;
        if let Some(build) = task.as_any().downcast_ref::<BuildTask>() {
            self.building = build.building.clone();
            self.count = Some(i64::from(build.core.max_count));
            self.cost = Some(build.core.base_price);
        }
        Ok(())
    }
}
