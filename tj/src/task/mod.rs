//! Task entity and state machine
//!
//! A task is a trait object (`Box<dyn Task>`) whose shared progress fields live
//! in [`TaskCore`]. Concrete kinds live in [`kinds`] and override the event
//! hooks for the channels they declare in [`Task::channels`].
//!
//! # States
//!
//! ```text
//!              increment_count / mark_as_completed
//!   Standby ──────────────────────────────────────────┐
//!  (!active)                                          ▼
//!      ▲        InProgress ─────────────────────────▶ Done
//!      │      (active, !complete)                 (complete)
//!      │                                              │
//!      └──────────── end-of-day renewal ──────────────┘
//! ```

pub mod kinds;
mod matcher;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::{Period, WorldDate};
use crate::domain::PlayerId;
use crate::events::{
    BuildingConstructed, Channel, Channels, FarmAnimalTraded, InventoryChanged, ItemGifted, ItemReceived,
    SalablePurchased, SalableSold, TaskStatusChanged,
};

pub use matcher::{FLAVOR_SEPARATOR, ItemMatcher, split_flavored};

/// Progress fields shared by every task kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCore {
    /// Kind tag selecting behavior, factory and decoder
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub owner_id: PlayerId,
    #[serde(default)]
    pub count: u32,
    #[serde(default = "default_max_count")]
    pub max_count: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub complete: bool,
    /// Price per unit; negative for kinds that earn money
    #[serde(default)]
    pub base_price: i64,
    #[serde(default)]
    pub renew_period: Period,
    #[serde(default)]
    pub renew_date: WorldDate,
    #[serde(default)]
    pub has_been_viewed: bool,
    /// Secondary ordering key, rebuilt from list position
    #[serde(skip)]
    pub sorting_index: usize,
}

fn default_max_count() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

impl TaskCore {
    pub fn new(kind: &str, name: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.into(),
            owner_id: PlayerId::LEGACY,
            count: 0,
            max_count: 1,
            active: true,
            complete: false,
            base_price: 0,
            renew_period: Period::Never,
            renew_date: WorldDate::default(),
            has_been_viewed: false,
            sorting_index: 0,
        }
    }

    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count.max(1);
        self
    }

    pub fn with_base_price(mut self, base_price: i64) -> Self {
        self.base_price = base_price;
        self
    }

    /// Units still missing before completion
    pub fn remaining(&self) -> u32 {
        self.max_count.saturating_sub(self.count)
    }

    /// Restore the count bounds after decoding a stored record
    pub fn normalize(&mut self) {
        self.max_count = self.max_count.max(1);
        self.count = self.count.min(self.max_count);
        if self.complete {
            self.count = self.max_count;
        }
    }
}

/// Snapshot of the fields that make up a task's visible status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStatus {
    pub active: bool,
    pub complete: bool,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskState {
    InProgress,
    Done,
    Standby,
}

impl TaskState {
    /// Group order used by list sorting
    pub fn rank(self) -> u8 {
        match self {
            TaskState::InProgress => 0,
            TaskState::Done => 1,
            TaskState::Standby => 2,
        }
    }
}

/// Object-safe plumbing implemented for every concrete task type
pub trait AnyTask {
    fn clone_box(&self) -> Box<dyn Task>;

    /// Encode as a stored record, including the `kind` tag
    fn to_record(&self) -> serde_json::Result<Value>;

    fn as_any(&self) -> &dyn Any;
}

impl<T> AnyTask for T
where
    T: Task + Clone + Serialize + 'static,
{
    fn clone_box(&self) -> Box<dyn Task> {
        Box::new(self.clone())
    }

    fn to_record(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A trackable unit of progress
///
/// Every event hook defaults to a no-op; a kind overrides the hooks for the
/// channels it returns from [`Task::channels`]. Hooks must apply the
/// ownership guard (`can_update() && is_owner(actor)`) before changing
/// anything.
pub trait Task: AnyTask + Send + Sync + fmt::Debug {
    fn core(&self) -> &TaskCore;

    fn core_mut(&mut self) -> &mut TaskCore;

    /// Bus channels this task listens on
    fn channels(&self) -> Channels {
        Channels::empty()
    }

    /// Rebuild derived state after decoding or editing
    fn validate(&mut self) {}

    fn kind(&self) -> &str {
        &self.core().kind
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn active(&self) -> bool {
        self.core().active
    }

    fn set_active(&mut self, active: bool) {
        self.core_mut().active = active;
    }

    fn complete(&self) -> bool {
        self.core().complete
    }

    /// User toggle; completing fills the count, un-completing leaves it
    fn set_complete(&mut self, complete: bool) {
        if complete {
            self.mark_as_completed();
        } else {
            self.core_mut().complete = false;
        }
    }

    fn status(&self) -> TaskStatus {
        TaskStatus {
            active: self.active(),
            complete: self.complete(),
            count: self.core().count,
        }
    }

    fn state(&self) -> TaskState {
        if self.complete() {
            TaskState::Done
        } else if self.active() {
            TaskState::InProgress
        } else {
            TaskState::Standby
        }
    }

    /// Whether event handlers may change this task
    fn can_update(&self) -> bool {
        !self.complete() && (self.core().renew_period == Period::Never || self.active())
    }

    fn is_owner(&self, actor: PlayerId) -> bool {
        self.core().owner_id == actor
    }

    /// Ownership guard applied by every event hook
    fn accepts(&self, actor: PlayerId) -> bool {
        self.can_update() && self.is_owner(actor)
    }

    fn increment_count(&mut self, amount: u32) {
        if !self.active() || self.complete() {
            return;
        }
        let core = self.core_mut();
        core.count = core.count.saturating_add(amount).min(core.max_count);
        if core.count == core.max_count {
            self.mark_as_completed();
        }
    }

    fn mark_as_completed(&mut self) {
        let core = self.core_mut();
        core.count = core.max_count;
        core.complete = true;
        core.has_been_viewed = false;
    }

    /// Days until the renewal date comes around again
    fn days_until_renewal(&self, today: WorldDate) -> i64 {
        let core = self.core();
        core.renew_period.days_until(today, core.renew_date)
    }

    fn schedule_renewal(&mut self, period: Period, date: WorldDate) {
        let core = self.core_mut();
        core.renew_period = period;
        core.renew_date = date;
    }

    /// Money still needed (positive) or still to be earned (negative)
    ///
    /// Saturates at the `i64` bounds.
    fn price(&self) -> i64 {
        let core = self.core();
        core.base_price.saturating_mul(i64::from(core.remaining()))
    }

    /// Whether a progress bar is meaningful for this task
    fn show_progress(&self) -> bool {
        false
    }

    fn on_item_collected(&mut self, _args: &ItemReceived) {}

    fn on_item_crafted(&mut self, _args: &ItemReceived) {}

    fn on_item_gifted(&mut self, _args: &ItemGifted) {}

    fn on_salable_purchased(&mut self, _args: &SalablePurchased) {}

    fn on_salable_sold(&mut self, _args: &SalableSold) {}

    fn on_building_constructed(&mut self, _args: &BuildingConstructed) {}

    fn on_farm_animal_purchased(&mut self, _args: &FarmAnimalTraded) {}

    fn on_farm_animal_sold(&mut self, _args: &FarmAnimalTraded) {}

    fn on_inventory_changed(&mut self, _args: &InventoryChanged) {}
}

impl Clone for Box<dyn Task> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Shared handle to a live task
///
/// Lists hold handles and event listeners capture clones of them. Locks are
/// never held while an event is raised.
#[derive(Clone)]
pub struct TaskHandle(Arc<RwLock<Box<dyn Task>>>);

impl TaskHandle {
    pub fn new(task: Box<dyn Task>) -> Self {
        Self(Arc::new(RwLock::new(task)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn Task>> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn Task>> {
        self.0.write()
    }

    /// Whether both handles point at the same task
    pub fn ptr_eq(&self, other: &TaskHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Detached copy of the task
    pub fn snapshot(&self) -> Box<dyn Task> {
        self.read().clone_box()
    }

    /// Apply `f` and raise `status_changed` if the visible status moved
    pub fn update<F>(&self, status_changed: &Channel<TaskStatusChanged>, f: F)
    where
        F: FnOnce(&mut dyn Task),
    {
        let (old, new) = {
            let mut task = self.write();
            let old = task.status();
            f(&mut **task);
            (old, task.status())
        };
        if old != new && status_changed.has_listeners() {
            status_changed.raise(&TaskStatusChanged {
                task: self.clone(),
                old,
                new,
            });
        }
    }
}

impl From<Box<dyn Task>> for TaskHandle {
    fn from(task: Box<dyn Task>) -> Self {
        Self::new(task)
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(task) => f
                .debug_struct("TaskHandle")
                .field("kind", &task.kind())
                .field("name", &task.name())
                .finish(),
            None => f.write_str("TaskHandle(<locked>)"),
        }
    }
}
