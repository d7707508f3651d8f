//! Task manager
//!
//! Owns the task lists of the loaded save, one per owner, and moves them in
//! and out of the data store. The end-of-day sweep renews periodic tasks and
//! drops finished ones.

use std::collections::BTreeMap;
use std::sync::Arc;

use journalstore::DataStore;
use tracing::{debug, info};

use crate::date::{Period, WorldDate};
use crate::domain::PlayerId;
use crate::error::{JournalError, Result};
use crate::events::TaskEvents;
use crate::factory::TaskRegistry;
use crate::list::TaskList;
use crate::persistence::{SaveTasks, TASKS_DATA_KEY, TaskData};
use crate::task::{Task, TaskHandle};

/// The loaded save and the player running this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub save_id: String,
    pub local_player: PlayerId,
}

/// Outcome of one end-of-day sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayEndReport {
    /// Completed periodic tasks put back on standby
    pub renewed: usize,
    /// Standby tasks whose renewal date arrived
    pub reactivated: usize,
    /// Completed one-off tasks removed
    pub removed: usize,
}

pub struct TaskManager {
    events: Arc<TaskEvents>,
    registry: TaskRegistry,
    store: Arc<dyn DataStore>,
    data: TaskData,
    lists: BTreeMap<PlayerId, TaskList>,
    session: Option<Session>,
}

impl TaskManager {
    pub fn new(events: Arc<TaskEvents>, registry: TaskRegistry, store: Arc<dyn DataStore>) -> Self {
        debug!(kinds = registry.kinds().count(), "TaskManager::new: called");
        Self {
            events,
            registry,
            store,
            data: TaskData::new(),
            lists: BTreeMap::new(),
            session: None,
        }
    }

    pub fn events(&self) -> &Arc<TaskEvents> {
        &self.events
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Load the task lists of `save_id`
    ///
    /// Tasks stored without an owner are given to `local_player`. On a decode
    /// error nothing stays loaded.
    pub fn load(&mut self, save_id: &str, local_player: PlayerId) -> Result<()> {
        info!(save_id, %local_player, "TaskManager::load");
        self.unload();

        self.data = match self.store.read(TASKS_DATA_KEY)? {
            Some(value) => TaskData::decode(value, &self.registry)?,
            None => TaskData::new(),
        };

        if let Some(owners) = self.data.take_save(save_id) {
            for (owner, tasks) in owners {
                let owner = if owner.is_legacy() { local_player } else { owner };
                let list = self.tasks_for(owner);
                for task in tasks {
                    list.add(task);
                }
            }
        }
        for list in self.lists.values_mut() {
            list.sort();
        }

        self.session = Some(Session {
            save_id: save_id.to_string(),
            local_player,
        });
        info!(
            save_id,
            owners = self.lists.len(),
            tasks = self.lists.values().map(TaskList::len).sum::<usize>(),
            "TaskManager::load: loaded"
        );
        Ok(())
    }

    /// Write every non-empty list back under the loaded save
    pub fn save(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or(JournalError::NoSession)?;
        let owners: SaveTasks = self
            .lists
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(&owner, list)| (owner, list.snapshot()))
            .collect();
        info!(save_id = %session.save_id, owners = owners.len(), "TaskManager::save");

        self.data.set_save(session.save_id.clone(), owners);
        let value = self.data.encode().map_err(JournalError::Encode)?;
        self.store.write(TASKS_DATA_KEY, &value)?;
        Ok(())
    }

    /// Drop every list and forget the session
    pub fn unload(&mut self) {
        debug!(lists = self.lists.len(), "TaskManager::unload");
        for list in self.lists.values_mut() {
            list.clear();
        }
        self.lists.clear();
        self.session = None;
    }

    /// The local player's list
    pub fn tasks(&mut self) -> Result<&mut TaskList> {
        let owner = self.session.as_ref().ok_or(JournalError::NoSession)?.local_player;
        Ok(self.tasks_for(owner))
    }

    /// The list of `owner`, created on first use
    pub fn tasks_for(&mut self, owner: PlayerId) -> &mut TaskList {
        let events = &self.events;
        self.lists
            .entry(owner)
            .or_insert_with(|| TaskList::new(owner, Arc::clone(events)))
    }

    pub fn list(&self, owner: PlayerId) -> Option<&TaskList> {
        self.lists.get(&owner)
    }

    pub fn owners(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.lists.keys().copied()
    }

    /// Give `task` to the local player and append it to their list
    pub fn add(&mut self, task: Box<dyn Task>) -> Result<TaskHandle> {
        debug!(kind = task.kind(), name = task.name(), "TaskManager::add");
        Ok(self.tasks()?.add(task))
    }

    /// Sort the local player's list
    pub fn sort(&mut self) -> Result<()> {
        self.tasks()?.sort();
        Ok(())
    }

    /// Renew periodic tasks and remove finished ones, for every owner
    pub fn end_of_day(&mut self, today: WorldDate) -> DayEndReport {
        debug!(%today, "TaskManager::end_of_day: called");
        let status = &self.events.task_status_changed;
        let mut report = DayEndReport::default();

        for list in self.lists.values_mut() {
            for index in (0..list.len()).rev() {
                let Some(task) = list.get(index).cloned() else {
                    continue;
                };
                let mut finished = false;
                task.update(status, |t| {
                    if t.core().renew_period != Period::Never {
                        if t.complete() {
                            t.set_complete(false);
                            t.set_active(false);
                            report.renewed += 1;
                        }
                        if !t.active() && t.days_until_renewal(today) <= 1 {
                            t.set_active(true);
                            report.reactivated += 1;
                        }
                    }
                    finished = t.complete();
                });
                if finished {
                    list.remove_at(index);
                    report.removed += 1;
                }
            }
        }

        info!(
            renewed = report.renewed,
            reactivated = report.reactivated,
            removed = report.removed,
            "TaskManager::end_of_day: done"
        );
        report
    }
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("session", &self.session)
            .field("owners", &self.lists.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::Season;
    use crate::domain::Item;
    use crate::events::ItemReceived;
    use crate::task::kinds::{BasicTask, CollectTask};
    use journalstore::MemoryStore;
    use serde_json::json;

    fn manager_with(store: Arc<MemoryStore>) -> TaskManager {
        TaskManager::new(Arc::new(TaskEvents::local("journal")), TaskRegistry::builtin(), store)
    }

    fn manager() -> TaskManager {
        manager_with(Arc::new(MemoryStore::new()))
    }

    fn day(d: u32) -> WorldDate {
        WorldDate::new(1, Season::Spring, d)
    }

    #[test]
    fn test_requires_session() {
        let mut manager = manager();
        assert!(matches!(manager.tasks(), Err(JournalError::NoSession)));
        assert!(matches!(manager.save(), Err(JournalError::NoSession)));
    }

    #[test]
    fn test_end_of_day_removes_completed_one_off() {
        let mut manager = manager();
        manager.load("farm", PlayerId(1)).unwrap();
        let done = manager.add(Box::new(BasicTask::new("done"))).unwrap();
        manager.add(Box::new(BasicTask::new("open"))).unwrap();
        done.write().mark_as_completed();

        let report = manager.end_of_day(day(3));
        assert_eq!(report.removed, 1);
        let list = manager.tasks().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().read().name(), "open");
    }

    #[test]
    fn test_end_of_day_renews_weekly_far_from_date() {
        let mut manager = manager();
        manager.load("farm", PlayerId(1)).unwrap();
        let task = manager.add(Box::new(BasicTask::new("weekly"))).unwrap();
        task.write().schedule_renewal(Period::Weekly, day(1));
        task.write().mark_as_completed();

        // Spring 3 is a Wednesday; the next Monday is five days away
        let report = manager.end_of_day(day(3));
        assert_eq!(report, DayEndReport { renewed: 1, reactivated: 0, removed: 0 });
        let task = task.read();
        assert!(!task.complete());
        assert!(!task.active());
        assert_eq!(task.core().count, task.core().max_count);
    }

    #[test]
    fn test_end_of_day_reactivates_on_eve_of_renewal() {
        let mut manager = manager();
        manager.load("farm", PlayerId(1)).unwrap();
        let task = manager.add(Box::new(BasicTask::new("weekly"))).unwrap();
        task.write().schedule_renewal(Period::Weekly, day(8));
        task.write().mark_as_completed();

        let report = manager.end_of_day(day(7));
        assert_eq!(report, DayEndReport { renewed: 1, reactivated: 1, removed: 0 });
        assert!(task.read().active());
        assert!(!task.read().complete());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(Arc::clone(&store));
        manager.load("farm", PlayerId(1)).unwrap();
        manager
            .add(Box::new(CollectTask::new("wood", vec!["(O)388".to_string()], 10)))
            .unwrap();
        manager.tasks_for(PlayerId(2)).add(Box::new(BasicTask::new("farmhand")) as Box<dyn Task>);
        manager.tasks_for(PlayerId(3));
        manager.save().unwrap();

        let stored = store.read(TASKS_DATA_KEY).unwrap().unwrap();
        assert!(stored["tasks"]["farm"]["1"].is_array());
        assert!(stored["tasks"]["farm"].get("3").is_none());

        let mut reloaded = manager_with(store);
        reloaded.load("farm", PlayerId(1)).unwrap();
        assert_eq!(reloaded.owners().collect::<Vec<_>>(), vec![PlayerId(1), PlayerId(2)]);
        let wood = reloaded.tasks().unwrap().get(0).unwrap().clone();
        assert_eq!(wood.read().core().owner_id, PlayerId(1));

        reloaded.events().item_collected.raise(&ItemReceived {
            actor: PlayerId(1),
            item: Item::new("(O)388", "Wood"),
            count: 2,
        });
        assert_eq!(wood.read().core().count, 2);
    }

    #[test]
    fn test_load_remaps_legacy_owner() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(
                TASKS_DATA_KEY,
                &json!({ "tasks": {
                    "farm": [ { "kind": "basic", "name": "old" } ],
                    "other": { "4": [ { "kind": "basic", "name": "elsewhere" } ] }
                } }),
            )
            .unwrap();

        let mut manager = manager_with(Arc::clone(&store));
        manager.load("farm", PlayerId(42)).unwrap();
        assert_eq!(manager.owners().collect::<Vec<_>>(), vec![PlayerId(42)]);
        let task = manager.tasks().unwrap().get(0).unwrap().clone();
        assert_eq!(task.read().core().owner_id, PlayerId(42));

        manager.save().unwrap();
        let stored = store.read(TASKS_DATA_KEY).unwrap().unwrap();
        assert_eq!(stored["version"], crate::persistence::FORMAT_VERSION);
        assert_eq!(stored["tasks"]["farm"]["42"][0]["name"], "old");
        assert_eq!(stored["tasks"]["other"]["4"][0]["name"], "elsewhere");
    }

    #[test]
    fn test_load_failure_leaves_nothing_loaded() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(TASKS_DATA_KEY, &json!({ "tasks": { "farm": [ { "name": "no kind" } ] } }))
            .unwrap();
        let mut manager = manager_with(store);
        assert!(matches!(manager.load("farm", PlayerId(1)), Err(JournalError::Decode(_))));
        assert!(manager.session().is_none());
        assert_eq!(manager.owners().count(), 0);
    }

    #[test]
    fn test_load_unsubscribes_previous_lists() {
        let mut manager = manager();
        manager.load("farm", PlayerId(1)).unwrap();
        manager
            .add(Box::new(CollectTask::new("wood", vec!["(O)388".to_string()], 10)))
            .unwrap();
        assert!(manager.events().item_collected.has_listeners());

        manager.load("farm", PlayerId(1)).unwrap();
        assert!(!manager.events().item_collected.has_listeners());
        manager.unload();
        assert!(manager.session().is_none());
    }
}
