//! Task event bus
//!
//! [`TaskEvents`] owns one channel per host event plus the two outbound
//! engine events. Task lists subscribe task handlers through it, and inbound
//! broadcast traffic is routed to the right channel by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, trace, warn};

use super::channel::{Channel, Subscription, Unsubscribe};
use super::error::EventError;
use super::net::{NetChannel, NullTransport, Route, Transport, WireMessage};
use super::types::{
    BuildingConstructed, FarmAnimalTraded, InventoryChanged, ItemGifted, ItemReceived, SalablePurchased, SalableSold,
    TaskListChanged, TaskStatusChanged,
};
use crate::task::{Task, TaskHandle};

/// Channel names, also used as the `channelName` of wire messages
pub mod names {
    pub const ITEM_COLLECTED: &str = "item-collected";
    pub const ITEM_CRAFTED: &str = "item-crafted";
    pub const ITEM_GIFTED: &str = "item-gifted";
    pub const SALABLE_PURCHASED: &str = "salable-purchased";
    pub const SALABLE_SOLD: &str = "salable-sold";
    pub const BUILDING_CONSTRUCTED: &str = "building-constructed";
    pub const FARM_ANIMAL_PURCHASED: &str = "farm-animal-purchased";
    pub const FARM_ANIMAL_SOLD: &str = "farm-animal-sold";
    pub const INVENTORY_CHANGED: &str = "inventory-changed";
    pub const TASK_STATUS_CHANGED: &str = "task-status-changed";
    pub const TASK_LIST_CHANGED: &str = "task-list-changed";
}

bitflags! {
    /// Host event channels a task listens on
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Channels: u16 {
        const ITEM_COLLECTED = 1 << 0;
        const ITEM_CRAFTED = 1 << 1;
        const ITEM_GIFTED = 1 << 2;
        const SALABLE_PURCHASED = 1 << 3;
        const SALABLE_SOLD = 1 << 4;
        const BUILDING_CONSTRUCTED = 1 << 5;
        const FARM_ANIMAL_PURCHASED = 1 << 6;
        const FARM_ANIMAL_SOLD = 1 << 7;
        const INVENTORY_CHANGED = 1 << 8;
    }
}

type Hook<A> = fn(&mut dyn Task, &A);

/// Channels connecting host events to tasks
pub struct TaskEvents {
    mod_id: String,
    pub item_collected: Arc<Channel<ItemReceived>>,
    pub item_crafted: Arc<Channel<ItemReceived>>,
    pub item_gifted: Arc<Channel<ItemGifted>>,
    pub salable_purchased: Arc<Channel<SalablePurchased>>,
    pub salable_sold: Arc<Channel<SalableSold>>,
    /// Raised on every participant when any of them finishes a building
    pub building_constructed: Arc<NetChannel<BuildingConstructed>>,
    pub farm_animal_purchased: Arc<Channel<FarmAnimalTraded>>,
    pub farm_animal_sold: Arc<Channel<FarmAnimalTraded>>,
    pub inventory_changed: Arc<Channel<InventoryChanged>>,
    pub task_status_changed: Arc<Channel<TaskStatusChanged>>,
    pub task_list_changed: Arc<Channel<TaskListChanged>>,
    unsubscribe: HashMap<&'static str, Arc<dyn Unsubscribe>>,
    routes: HashMap<&'static str, Arc<dyn Route>>,
}

impl TaskEvents {
    pub fn new(mod_id: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let mod_id = mod_id.into();
        debug!(%mod_id, "TaskEvents::new: called");

        let item_collected = Arc::new(Channel::new(names::ITEM_COLLECTED));
        let item_crafted = Arc::new(Channel::new(names::ITEM_CRAFTED));
        let item_gifted = Arc::new(Channel::new(names::ITEM_GIFTED));
        let salable_purchased = Arc::new(Channel::new(names::SALABLE_PURCHASED));
        let salable_sold = Arc::new(Channel::new(names::SALABLE_SOLD));
        let building_constructed = Arc::new(NetChannel::new(
            names::BUILDING_CONSTRUCTED,
            mod_id.clone(),
            transport,
        ));
        let farm_animal_purchased = Arc::new(Channel::new(names::FARM_ANIMAL_PURCHASED));
        let farm_animal_sold = Arc::new(Channel::new(names::FARM_ANIMAL_SOLD));
        let inventory_changed = Arc::new(Channel::new(names::INVENTORY_CHANGED));
        let task_status_changed = Arc::new(Channel::new(names::TASK_STATUS_CHANGED));
        let task_list_changed = Arc::new(Channel::new(names::TASK_LIST_CHANGED));

        let erased: [Arc<dyn Unsubscribe>; 11] = [
            item_collected.clone(),
            item_crafted.clone(),
            item_gifted.clone(),
            salable_purchased.clone(),
            salable_sold.clone(),
            building_constructed.clone(),
            farm_animal_purchased.clone(),
            farm_animal_sold.clone(),
            inventory_changed.clone(),
            task_status_changed.clone(),
            task_list_changed.clone(),
        ];
        let unsubscribe = erased.into_iter().map(|c| (c.channel_name(), c)).collect();

        let mut routes: HashMap<&'static str, Arc<dyn Route>> = HashMap::new();
        routes.insert(names::BUILDING_CONSTRUCTED, building_constructed.clone());

        Self {
            mod_id,
            item_collected,
            item_crafted,
            item_gifted,
            salable_purchased,
            salable_sold,
            building_constructed,
            farm_animal_purchased,
            farm_animal_sold,
            inventory_changed,
            task_status_changed,
            task_list_changed,
            unsubscribe,
            routes,
        }
    }

    /// Bus for a single-participant session
    pub fn local(mod_id: impl Into<String>) -> Self {
        Self::new(mod_id, Arc::new(NullTransport))
    }

    pub fn mod_id(&self) -> &str {
        &self.mod_id
    }

    /// Remove a listener from whichever channel it was added to
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.unsubscribe
            .get(subscription.channel())
            .is_some_and(|channel| channel.unsubscribe(subscription))
    }

    /// Route an inbound message, reporting why it was not delivered
    ///
    /// Returns `Ok(false)` for messages sent by other mods.
    pub fn try_receive(&self, message: WireMessage) -> Result<bool, EventError> {
        if message.sender_mod_id != self.mod_id {
            trace!(sender = %message.sender_mod_id, "TaskEvents::try_receive: foreign mod id");
            return Ok(false);
        }
        let route = self
            .routes
            .get(message.channel_name.as_str())
            .ok_or_else(|| EventError::UnknownChannel(message.channel_name.clone()))?;
        route.route(message.payload)?;
        Ok(true)
    }

    /// Route an inbound message; undeliverable messages are logged and dropped
    pub fn receive(&self, message: WireMessage) {
        debug!(channel = %message.channel_name, "TaskEvents::receive");
        match self.try_receive(message) {
            Ok(_) => {}
            Err(e @ EventError::UnknownChannel(_)) => warn!(error = %e, "TaskEvents::receive: dropped"),
            Err(e) => error!(error = %e, "TaskEvents::receive: malformed payload dropped"),
        }
    }

    /// Drain every message currently waiting in `inbox`
    pub fn pump(&self, inbox: &mut UnboundedReceiver<WireMessage>) -> usize {
        let mut handled = 0;
        while let Ok(message) = inbox.try_recv() {
            self.receive(message);
            handled += 1;
        }
        if handled > 0 {
            debug!(handled, "TaskEvents::pump: drained inbox");
        }
        handled
    }

    /// Connect a task's handlers to the channels it declares
    pub(crate) fn subscribe_task(&self, task: &TaskHandle) -> Vec<Subscription> {
        let channels = task.read().channels();
        let mut subscriptions = Vec::with_capacity(channels.bits().count_ones() as usize);

        if channels.contains(Channels::ITEM_COLLECTED) {
            subscriptions.push(self.hook(&self.item_collected, task, |t, a| t.on_item_collected(a)));
        }
        if channels.contains(Channels::ITEM_CRAFTED) {
            subscriptions.push(self.hook(&self.item_crafted, task, |t, a| t.on_item_crafted(a)));
        }
        if channels.contains(Channels::ITEM_GIFTED) {
            subscriptions.push(self.hook(&self.item_gifted, task, |t, a| t.on_item_gifted(a)));
        }
        if channels.contains(Channels::SALABLE_PURCHASED) {
            subscriptions.push(self.hook(&self.salable_purchased, task, |t, a| t.on_salable_purchased(a)));
        }
        if channels.contains(Channels::SALABLE_SOLD) {
            subscriptions.push(self.hook(&self.salable_sold, task, |t, a| t.on_salable_sold(a)));
        }
        if channels.contains(Channels::BUILDING_CONSTRUCTED) {
            subscriptions.push(self.hook(self.building_constructed.local(), task, |t, a| {
                t.on_building_constructed(a)
            }));
        }
        if channels.contains(Channels::FARM_ANIMAL_PURCHASED) {
            subscriptions.push(self.hook(&self.farm_animal_purchased, task, |t, a| {
                t.on_farm_animal_purchased(a)
            }));
        }
        if channels.contains(Channels::FARM_ANIMAL_SOLD) {
            subscriptions.push(self.hook(&self.farm_animal_sold, task, |t, a| t.on_farm_animal_sold(a)));
        }
        if channels.contains(Channels::INVENTORY_CHANGED) {
            subscriptions.push(self.hook(&self.inventory_changed, task, |t, a| t.on_inventory_changed(a)));
        }

        trace!(count = subscriptions.len(), "TaskEvents::subscribe_task");
        subscriptions
    }

    fn hook<A: 'static>(&self, channel: &Channel<A>, task: &TaskHandle, apply: Hook<A>) -> Subscription {
        let task = task.clone();
        let status = Arc::clone(&self.task_status_changed);
        channel.add(move |args: &A| task.update(&status, |t| apply(t, args)))
    }
}

impl fmt::Debug for TaskEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskEvents")
            .field("mod_id", &self.mod_id)
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}
