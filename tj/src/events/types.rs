//! Event argument types
//!
//! Inbound events are raised by host hooks. Every one of them carries the
//! acting participant so tasks can ignore progress made by other players.

use serde::{Deserialize, Serialize};

use crate::domain::{Building, FarmAnimal, Item, PlayerId};
use crate::task::{TaskHandle, TaskStatus};

use super::net::NetEvent;

/// An item entered a player's inventory (collected or crafted)
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReceived {
    pub actor: PlayerId,
    pub item: Item,
    pub count: u32,
}

/// An item was given to an NPC
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGifted {
    pub actor: PlayerId,
    pub npc: String,
    pub item: Item,
}

/// A salable was bought from a shop
#[derive(Debug, Clone, PartialEq)]
pub struct SalablePurchased {
    pub actor: PlayerId,
    pub salable: Item,
    pub amount: u32,
}

/// A salable was sold to a shop
#[derive(Debug, Clone, PartialEq)]
pub struct SalableSold {
    pub actor: PlayerId,
    pub salable: Item,
    pub amount: u32,
}

/// A farm animal was bought or sold
#[derive(Debug, Clone, PartialEq)]
pub struct FarmAnimalTraded {
    pub actor: PlayerId,
    pub animal_type: String,
    pub animal: FarmAnimal,
}

/// Items were added to a player's inventory
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryChanged {
    pub actor: PlayerId,
    pub added: Vec<Item>,
    /// Base name of the tool currently at the blacksmith, if any
    pub tool_being_upgraded: Option<String>,
}

/// A building finished construction or an upgrade
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingConstructed {
    pub actor: PlayerId,
    pub location: String,
    pub building: Building,
    pub is_upgrade: bool,
}

impl BuildingConstructed {
    /// Name of the building once construction is done
    pub fn name_after_construction(&self) -> &str {
        if self.is_upgrade {
            self.building
                .next_upgrade
                .as_deref()
                .unwrap_or(&self.building.building_type)
        } else {
            &self.building.building_type
        }
    }
}

/// Transport form of [`BuildingConstructed`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingConstructedMessage {
    pub player_id: i64,
    pub location_name: String,
    pub building_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_upgrade: Option<String>,
    #[serde(default)]
    pub is_cabin: bool,
    #[serde(default)]
    pub is_upgrade: bool,
}

impl NetEvent for BuildingConstructed {
    type Message = BuildingConstructedMessage;

    fn to_message(&self) -> Self::Message {
        BuildingConstructedMessage {
            player_id: self.actor.0,
            location_name: self.location.clone(),
            building_type: self.building.building_type.clone(),
            next_upgrade: self.building.next_upgrade.clone(),
            is_cabin: self.building.is_cabin,
            is_upgrade: self.is_upgrade,
        }
    }

    fn from_message(message: Self::Message) -> Self {
        Self {
            actor: PlayerId(message.player_id),
            location: message.location_name,
            building: Building {
                building_type: message.building_type,
                next_upgrade: message.next_upgrade,
                is_cabin: message.is_cabin,
            },
            is_upgrade: message.is_upgrade,
        }
    }
}

/// A task's active/complete/count changed
#[derive(Debug, Clone)]
pub struct TaskStatusChanged {
    pub task: TaskHandle,
    pub old: TaskStatus,
    pub new: TaskStatus,
}

impl TaskStatusChanged {
    /// The change completed the task
    pub fn completed(&self) -> bool {
        !self.old.complete && self.new.complete
    }
}

/// Tasks were added to or removed from an owner's list
#[derive(Debug, Clone)]
pub struct TaskListChanged {
    pub owner: PlayerId,
    pub added: Vec<TaskHandle>,
    pub removed: Vec<TaskHandle>,
}
