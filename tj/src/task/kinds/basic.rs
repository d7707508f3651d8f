use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::factory::{FactoryError, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind, lookup};
use crate::task::{Task, TaskCore};

/// A free-form task completed by hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicTask {
    #[serde(flatten)]
    core: TaskCore,
}

impl BasicTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: TaskCore::new(Self::KIND, name),
        }
    }
}

impl Task for BasicTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }
}

impl TaskKind for BasicTask {
    const KIND: &'static str = "basic";
    const ICONS: SmartIcons = SmartIcons::empty();
    type Factory = BasicFactory;
}

#[derive(Debug, Clone, Default)]
pub struct BasicFactory;

impl TaskFactory for BasicFactory {
    fn kind(&self) -> &'static str {
        BasicTask::KIND
    }

    fn parameters(&self) -> &'static [TaskParameter] {
        &[]
    }

    fn get(&self, _name: &str) -> Option<ParamValue> {
        None
    }

    fn set(&mut self, name: &str, _value: ParamValue) -> Result<(), FactoryError> {
        lookup(self.kind(), self.parameters(), name).map(|_| ())
    }

    fn build(&self, name: &str, _catalog: &dyn Catalog) -> Option<Box<dyn Task>> {
        Some(Box::new(BasicTask::new(name)))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)
    }
}
