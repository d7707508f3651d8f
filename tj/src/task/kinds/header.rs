use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::factory::{FactoryError, ParamValue, SmartIcons, TaskFactory, TaskKind, TaskParameter, expect_kind, lookup};
use crate::task::{Task, TaskCore};

/// Section label in a task list
///
/// Always active and never complete, so it is never renewed or swept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderTask {
    #[serde(flatten)]
    core: TaskCore,
}

impl HeaderTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: TaskCore::new(Self::KIND, name),
        }
    }
}

impl Task for HeaderTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn validate(&mut self) {
        self.core.active = true;
        self.core.complete = false;
        self.core.count = 0;
    }

    fn active(&self) -> bool {
        true
    }

    fn set_active(&mut self, _active: bool) {}

    fn complete(&self) -> bool {
        false
    }

    fn set_complete(&mut self, _complete: bool) {}

    fn can_update(&self) -> bool {
        false
    }

    fn increment_count(&mut self, _amount: u32) {}

    fn mark_as_completed(&mut self) {}
}

impl TaskKind for HeaderTask {
    const KIND: &'static str = "header";
    const ICONS: SmartIcons = SmartIcons::empty();
    type Factory = HeaderFactory;
}

#[derive(Debug, Clone, Default)]
pub struct HeaderFactory;

impl TaskFactory for HeaderFactory {
    fn kind(&self) -> &'static str {
        HeaderTask::KIND
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
        Some(Box::new(HeaderTask::new(name)))
    }

    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError> {
        expect_kind(self.kind(), task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::{Period, WorldDate};

    #[test]
    fn test_decoded_header_is_repinned() {
        let mut header: HeaderTask =
            serde_json::from_value(serde_json::json!({ "kind": "header", "name": "Fall", "active": false, "complete": true }))
                .unwrap();
        header.validate();
        assert!(header.core().active);
        assert!(!header.core().complete);
    }

    #[test]
    fn test_header_never_renews() {
        let mut header = HeaderTask::new("Weekly");
        header.schedule_renewal(Period::Weekly, WorldDate::default());
        assert!(!header.can_update());
        assert_eq!(header.state(), crate::task::TaskState::InProgress);
    }
}
