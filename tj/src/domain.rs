//! Host domain values carried by journal events

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque id of a participant (player instance) in a save
///
/// Id 0 marks records written before ownership was tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl PlayerId {
    /// Owner of records written before ownership was tracked
    pub const LEGACY: PlayerId = PlayerId(0);

    pub fn is_legacy(self) -> bool {
        self == Self::LEGACY
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PlayerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for PlayerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(PlayerId)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemCategory {
    /// Regular object (crops, forage, artisan goods, ...)
    #[default]
    Object,
    BigCraftable,
    Tool,
    Ring,
    Furniture,
    Other,
}

/// An item (or other salable) as delivered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Qualified item id, e.g. `(O)24`
    pub qualified_id: String,
    /// Internal base name; for tools this ignores the upgrade level
    pub base_name: String,
    #[serde(default)]
    pub category: ItemCategory,
    #[serde(default = "default_stack")]
    pub stack: u32,
    /// Qualified id of the ingredient for preserves (wine, jelly, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserved_parent_id: Option<String>,
}

fn default_stack() -> u32 {
    1
}

impl Item {
    pub fn new(qualified_id: impl Into<String>, base_name: impl Into<String>) -> Self {
        Self {
            qualified_id: qualified_id.into(),
            base_name: base_name.into(),
            category: ItemCategory::Object,
            stack: 1,
            preserved_parent_id: None,
        }
    }

    /// A tool identified by its base name
    pub fn tool(base_name: impl Into<String>) -> Self {
        let base_name = base_name.into();
        Self {
            qualified_id: format!("(T){}", base_name),
            base_name,
            category: ItemCategory::Tool,
            stack: 1,
            preserved_parent_id: None,
        }
    }

    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_stack(mut self, stack: u32) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_preserved_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.preserved_parent_id = Some(parent_id.into());
        self
    }

    pub fn is_tool(&self) -> bool {
        self.category == ItemCategory::Tool
    }
}

/// A building that was just constructed or upgraded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub building_type: String,
    /// Name of the building this one becomes when upgraded, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_upgrade: Option<String>,
    #[serde(default)]
    pub is_cabin: bool,
}

impl Building {
    pub fn new(building_type: impl Into<String>) -> Self {
        Self {
            building_type: building_type.into(),
            next_upgrade: None,
            is_cabin: false,
        }
    }

    pub fn cabin(building_type: impl Into<String>) -> Self {
        Self {
            is_cabin: true,
            ..Self::new(building_type)
        }
    }

    pub fn with_next_upgrade(mut self, next: impl Into<String>) -> Self {
        self.next_upgrade = Some(next.into());
        self
    }
}

/// Data of a farm animal type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmAnimal {
    #[serde(default)]
    pub purchase_price: i64,
    /// Building type the animal lives in
    #[serde(default)]
    pub house: String,
}
