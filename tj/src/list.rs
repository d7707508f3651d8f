//! Per-owner task lists
//!
//! A [`TaskList`] owns the subscriptions of the tasks it holds: adding a task
//! connects its handlers to the bus, and removing, replacing or clearing it
//! (or dropping the list) disconnects them again.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::domain::PlayerId;
use crate::events::{Subscription, TaskEvents, TaskListChanged};
use crate::task::{Task, TaskHandle};

struct Entry {
    task: TaskHandle,
    subscriptions: Vec<Subscription>,
}

/// Ordered tasks of one owner
pub struct TaskList {
    owner: PlayerId,
    events: Arc<TaskEvents>,
    entries: Vec<Entry>,
}

impl TaskList {
    pub fn new(owner: PlayerId, events: Arc<TaskEvents>) -> Self {
        debug!(%owner, "TaskList::new: called");
        Self {
            owner,
            events,
            entries: Vec::new(),
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TaskHandle> {
        self.entries.get(index).map(|e| &e.task)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskHandle> {
        self.entries.iter().map(|e| &e.task)
    }

    pub fn position(&self, task: &TaskHandle) -> Option<usize> {
        self.entries.iter().position(|e| e.task.ptr_eq(task))
    }

    /// Append a task, taking ownership of it, and subscribe its handlers
    pub fn add(&mut self, task: impl Into<TaskHandle>) -> TaskHandle {
        let index = self.entries.len();
        self.insert(index, task)
    }

    /// Insert at `index` (clamped to the end)
    pub fn insert(&mut self, index: usize, task: impl Into<TaskHandle>) -> TaskHandle {
        let task = task.into();
        let entry = self.attach(task.clone());
        let index = index.min(self.entries.len());
        debug!(owner = %self.owner, index, "TaskList::insert");
        self.entries.insert(index, entry);
        self.notify(vec![task.clone()], Vec::new());
        task
    }

    /// Replace the task at `index`, returning the old one
    pub fn set(&mut self, index: usize, task: impl Into<TaskHandle>) -> Option<TaskHandle> {
        if index >= self.entries.len() {
            return None;
        }
        let task = task.into();
        let entry = self.attach(task.clone());
        let old = std::mem::replace(&mut self.entries[index], entry);
        let old = self.detach(old);
        debug!(owner = %self.owner, index, "TaskList::set");
        self.notify(vec![task], vec![old.clone()]);
        Some(old)
    }

    pub fn remove(&mut self, task: &TaskHandle) -> bool {
        match self.position(task) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<TaskHandle> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        let old = self.detach(entry);
        debug!(owner = %self.owner, index, "TaskList::remove_at");
        self.notify(Vec::new(), vec![old.clone()]);
        Some(old)
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let removed: Vec<TaskHandle> = std::mem::take(&mut self.entries)
            .into_iter()
            .map(|e| self.detach(e))
            .collect();
        debug!(owner = %self.owner, count = removed.len(), "TaskList::clear");
        self.notify(Vec::new(), removed);
    }

    /// Group by state (in progress, done, standby), keeping relative order
    ///
    /// Raises a list change with nothing added or removed so views refresh.
    pub fn sort(&mut self) {
        for (i, entry) in self.entries.iter().enumerate() {
            entry.task.write().core_mut().sorting_index = i;
        }
        self.entries.sort_by_cached_key(|e| {
            let task = e.task.read();
            (task.state().rank(), task.core().sorting_index)
        });
        for (i, entry) in self.entries.iter().enumerate() {
            entry.task.write().core_mut().sorting_index = i;
        }
        self.notify(Vec::new(), Vec::new());
    }

    /// Detached copies of every task, in list order
    pub fn snapshot(&self) -> Vec<Box<dyn Task>> {
        self.entries.iter().map(|e| e.task.snapshot()).collect()
    }

    fn attach(&self, task: TaskHandle) -> Entry {
        task.write().core_mut().owner_id = self.owner;
        let subscriptions = self.events.subscribe_task(&task);
        Entry { task, subscriptions }
    }

    fn detach(&self, entry: Entry) -> TaskHandle {
        for subscription in entry.subscriptions {
            self.events.unsubscribe(subscription);
        }
        entry.task
    }

    fn notify(&self, added: Vec<TaskHandle>, removed: Vec<TaskHandle>) {
        if self.events.task_list_changed.has_listeners() {
            self.events.task_list_changed.raise(&TaskListChanged {
                owner: self.owner,
                added,
                removed,
            });
        }
    }
}

impl Drop for TaskList {
    fn drop(&mut self) {
        for entry in self.entries.drain(..) {
            for subscription in entry.subscriptions {
                self.events.unsubscribe(subscription);
            }
        }
    }
}

impl fmt::Debug for TaskList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskList")
            .field("owner", &self.owner)
            .field("tasks", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Item;
    use crate::events::ItemReceived;
    use crate::task::TaskState;
    use crate::task::kinds::{BasicTask, CollectTask};
    use parking_lot::Mutex;

    fn events() -> Arc<TaskEvents> {
        Arc::new(TaskEvents::local("journal"))
    }

    fn wood(owner: i64) -> Box<dyn Task> {
        let mut task = CollectTask::new("wood", vec!["(O)388".to_string()], 10);
        task.core_mut().owner_id = PlayerId(owner);
        Box::new(task)
    }

    fn basic(name: &str) -> Box<dyn Task> {
        Box::new(BasicTask::new(name))
    }

    fn collect_wood(events: &TaskEvents, count: u32) {
        events.item_collected.raise(&ItemReceived {
            actor: PlayerId(1),
            item: Item::new("(O)388", "Wood"),
            count,
        });
    }

    #[test]
    fn test_add_subscribes_remove_unsubscribes() {
        let events = events();
        let mut list = TaskList::new(PlayerId(1), Arc::clone(&events));
        let task = list.add(wood(1));
        assert_eq!(events.item_collected.listener_count(), 1);

        collect_wood(&events, 3);
        assert_eq!(task.read().core().count, 3);

        assert!(list.remove(&task));
        assert!(!events.item_collected.has_listeners());
        collect_wood(&events, 3);
        assert_eq!(task.read().core().count, 3);
        assert!(!list.remove(&task));
    }

    #[test]
    fn test_set_replaces_subscriptions() {
        let events = events();
        let mut list = TaskList::new(PlayerId(1), Arc::clone(&events));
        let old = list.add(wood(1));
        let new = TaskHandle::new(basic("chores"));
        let replaced = list.set(0, new.clone()).unwrap();
        assert!(replaced.ptr_eq(&old));
        assert!(list.get(0).unwrap().ptr_eq(&new));
        assert!(!events.item_collected.has_listeners());
        assert!(list.set(5, basic("x")).is_none());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let events = events();
        {
            let mut list = TaskList::new(PlayerId(1), Arc::clone(&events));
            list.add(wood(1));
            list.add(wood(1));
            assert_eq!(events.item_collected.listener_count(), 2);
        }
        assert!(!events.item_collected.has_listeners());
    }

    #[test]
    fn test_clear_raises_list_changed() {
        let events = events();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events
            .task_list_changed
            .add(move |e: &TaskListChanged| sink.lock().push((e.added.len(), e.removed.len())));

        let mut list = TaskList::new(PlayerId(1), Arc::clone(&events));
        list.add(wood(1));
        list.add(basic("a"));
        list.clear();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(*seen.lock(), vec![(1, 0), (1, 0), (0, 2)]);
        assert!(!events.item_collected.has_listeners());
    }

    #[test]
    fn test_sort_groups_by_state_stably() {
        let events = events();
        let mut list = TaskList::new(PlayerId(1), events);
        let done_a = list.add(basic("done a"));
        let standby = list.add(basic("standby"));
        let progress_a = list.add(basic("progress a"));
        let done_b = list.add(basic("done b"));
        let progress_b = list.add(basic("progress b"));
        done_a.write().mark_as_completed();
        done_b.write().mark_as_completed();
        standby.write().set_active(false);

        list.sort();
        let names: Vec<String> = list.iter().map(|t| t.read().name().to_string()).collect();
        assert_eq!(names, vec!["progress a", "progress b", "done a", "done b", "standby"]);
        assert!(list.get(0).unwrap().ptr_eq(&progress_a));
        assert!(list.get(1).unwrap().ptr_eq(&progress_b));
        assert_eq!(list.get(4).unwrap().read().state(), TaskState::Standby);
        assert_eq!(list.get(4).unwrap().read().core().sorting_index, 4);
    }

    #[test]
    fn test_sort_raises_empty_list_changed() {
        let events = events();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events
            .task_list_changed
            .add(move |e: &TaskListChanged| sink.lock().push((e.owner, e.added.len(), e.removed.len())));

        let mut list = TaskList::new(PlayerId(3), Arc::clone(&events));
        list.add(basic("a"));
        seen.lock().clear();
        list.sort();
        list.sort();
        assert_eq!(*seen.lock(), vec![(PlayerId(3), 0, 0), (PlayerId(3), 0, 0)]);
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut list = TaskList::new(PlayerId(1), events());
        list.add(basic("a"));
        list.insert(0, basic("b"));
        list.insert(99, basic("c"));
        let names: Vec<String> = list.iter().map(|t| t.read().name().to_string()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(list.snapshot().len(), 3);
        assert_eq!(list.position(list.get(2).unwrap()), Some(2));
    }
}
