use serde::{Deserialize, Serialize};

use super::{ANIMAL, COUNT, to_max_count};
use crate::catalog::Catalog;
use crate::events::{Channels, FarmAnimalTraded};
use crate::factory::{
    Constraint, FactoryError, ParamTag, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind,
    lookup,
};
use crate::task::{Task, TaskCore};

/// Buy farm animals of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalTask {
    #[serde(flatten)]
    core: TaskCore,
    animal_type: String,
}

impl AnimalTask {
    pub fn new(name: impl Into<String>, animal_type: impl Into<String>, count: u32, price: i64) -> Self {
        Self {
            core: TaskCore::new(Self::KIND, name)
                .with_max_count(count)
                .with_base_price(price),
            animal_type: animal_type.into(),
        }
    }

    pub fn animal_type(&self) -> &str {
        &self.animal_type
    }
}

impl Task for AnimalTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn channels(&self) -> Channels {
        Channels::FARM_ANIMAL_PURCHASED
    }

    fn show_progress(&self) -> bool {
        self.core.max_count > 1
    }

    fn on_farm_animal_purchased(&mut self, args: &FarmAnimalTraded) {
        if self.accepts(args.actor) && args.animal_type == self.animal_type {
            self.increment_count(1);
        }
    }
}

impl TaskKind for AnimalTask {
    const KIND: &'static str = "animal";
    const ICONS: SmartIcons = SmartIcons::ANIMAL;
    type Factory = AnimalFactory;
}

static PARAMS: [TaskParameter; 2] = [
    TaskParameter::new(ANIMAL, ParamTag::Animal).constraints(Constraint::NOT_EMPTY.union(Constraint::ANIMAL)),
    TaskParameter::new(COUNT, ParamTag::Count).constraints(Constraint::GE1),
];

#[derive(Debug, Clone)]
pub struct AnimalFactory {
    animal: String,
    count: Option<i64>,
}

impl Default for AnimalFactory {
    fn default() -> Self {
        Self {
            animal: String::new(),
            count: Some(1),
        }
    }
}

impl TaskFactory for AnimalFactory {
    fn kind(&self) -> &'static str {
        AnimalTask::KIND
    }

    fn parameters(&self) -> &'static [TaskParameter] {
        &PARAMS
    }

    fn get(&self, name: &str) -> Option<ParamValue> {
        match name {
            ANIMAL => Some(ParamValue::from_text(&self.animal)),
            COUNT => Some(ParamValue::from_number(self.count)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: ParamValue) -> Result<(), FactoryError> {
        let param = lookup(self.kind(), &PARAMS, name)?;
        match name {
            ANIMAL => self.animal = value.into_text(param)?,
            _ => self.count = value.into_number(param)?,
        }
        Ok(())
    }

    fn build(&self, name: &str, catalog: &dyn Catalog) -> Option<Box<dyn Task>> {
        let price = catalog.animal(&self.animal).map_or(0, |a| a.price);
        Some(Box::new(AnimalTask::new(
            name,
            self.animal.clone(),
            to_max_count(self.count),
            price,
        )))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)?;
        if let Some(animal) = task.as_any().downcast_ref::<AnimalTask>() {
            self.animal = animal.animal_type.clone();
            self.count = Some(i64::from(animal.core.max_count));
        }
        Ok(())
    }
}
