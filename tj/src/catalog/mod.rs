//! Game data lookups
//!
//! Factories validate parameters and price new tasks against the host's game
//! data. The engine only sees it through the [`Catalog`] trait; the
//! [`StaticCatalog`] implementation is loaded from YAML and ships with a small
//! built-in data set.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::ItemCategory;

/// Built-in catalog data (embedded in binary)
const BUILTIN_CATALOG: &str = include_str!("builtin.yml");

/// Errors from loading catalog data
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ItemInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: ItemCategory,
    /// Price a shop charges
    #[serde(default)]
    pub price: i64,
    /// Price a shop pays
    #[serde(default)]
    pub sell_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingInfo {
    pub name: String,
    #[serde(default)]
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalInfo {
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub house: String,
}

/// Read access to the host's game data
pub trait Catalog: Send + Sync {
    /// Look up an item by qualified id
    fn item(&self, id: &str) -> Option<&ItemInfo>;

    fn has_npc(&self, name: &str) -> bool;

    fn building(&self, name: &str) -> Option<&BuildingInfo>;

    fn animal(&self, animal_type: &str) -> Option<&AnimalInfo>;

    /// Whether `base_name` is a tool the blacksmith can upgrade
    fn has_tool(&self, base_name: &str) -> bool;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    items: Vec<ItemInfo>,
    npcs: Vec<String>,
    buildings: Vec<BuildingInfo>,
    animals: Vec<AnimalInfo>,
    tools: Vec<String>,
}

/// In-memory catalog backed by YAML data
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    items: HashMap<String, ItemInfo>,
    npcs: HashSet<String>,
    buildings: HashMap<String, BuildingInfo>,
    animals: HashMap<String, AnimalInfo>,
    tools: HashSet<String>,
}

impl StaticCatalog {
    /// An empty catalog; nothing resolves
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog embedded in the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        let catalog = Self::from(file);
        debug!(
            items = catalog.items.len(),
            npcs = catalog.npcs.len(),
            buildings = catalog.buildings.len(),
            animals = catalog.animals.len(),
            "StaticCatalog::from_yaml: loaded"
        );
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn with_item(mut self, item: ItemInfo) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_npc(mut self, name: impl Into<String>) -> Self {
        self.npcs.insert(name.into());
        self
    }

    pub fn with_building(mut self, name: impl Into<String>, cost: i64) -> Self {
        let name = name.into();
        self.buildings.insert(name.clone(), BuildingInfo { name, cost });
        self
    }

    pub fn with_animal(mut self, name: impl Into<String>, price: i64) -> Self {
        let name = name.into();
        self.animals.insert(
            name.clone(),
            AnimalInfo {
                name,
                price,
                house: String::new(),
            },
        );
        self
    }

    pub fn with_tool(mut self, base_name: impl Into<String>) -> Self {
        self.tools.insert(base_name.into());
        self
    }

    /// Items in id order
    pub fn items(&self) -> Vec<&ItemInfo> {
        let mut items: Vec<_> = self.items.values().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }
}

impl From<CatalogFile> for StaticCatalog {
    fn from(file: CatalogFile) -> Self {
        Self {
            items: file.items.into_iter().map(|i| (i.id.clone(), i)).collect(),
            npcs: file.npcs.into_iter().collect(),
            buildings: file.buildings.into_iter().map(|b| (b.name.clone(), b)).collect(),
            animals: file.animals.into_iter().map(|a| (a.name.clone(), a)).collect(),
            tools: file.tools.into_iter().collect(),
        }
    }
}

impl Catalog for StaticCatalog {
    fn item(&self, id: &str) -> Option<&ItemInfo> {
        self.items.get(id)
    }

    fn has_npc(&self, name: &str) -> bool {
        self.npcs.contains(name)
    }

    fn building(&self, name: &str) -> Option<&BuildingInfo> {
        self.buildings.get(name)
    }

    fn animal(&self, animal_type: &str) -> Option<&AnimalInfo> {
        self.animals.get(animal_type)
    }

    fn has_tool(&self, base_name: &str) -> bool {
        self.tools.contains(base_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = StaticCatalog::builtin().unwrap();
        let parsnip = catalog.item("(O)24").unwrap();
        assert_eq!(parsnip.name, "Parsnip");
        assert_eq!(parsnip.category, ItemCategory::Object);
        assert!(catalog.has_npc("Abigail"));
        assert_eq!(catalog.building("Coop").unwrap().cost, 4000);
        assert!(catalog.animal("White Chicken").is_some());
        assert!(catalog.has_tool("Pickaxe"));
    }

    #[test]
    fn test_builtin_big_craftable_category() {
        let catalog = StaticCatalog::builtin().unwrap();
        assert_eq!(catalog.item("(BC)10").unwrap().category, ItemCategory::BigCraftable);
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
npcs: [Krobus]
"#;
        let catalog = StaticCatalog::from_yaml(yaml).unwrap();
        assert!(catalog.has_npc("Krobus"));
        assert!(catalog.item("(O)24").is_none());
        assert!(!catalog.has_tool("Axe"));
    }

    #[test]
    fn test_from_yaml_invalid() {
        let result = StaticCatalog::from_yaml("items: 7");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_builder() {
        let catalog = StaticCatalog::new()
            .with_npc("Leah")
            .with_building("Shed", 15000)
            .with_tool("Hoe")
            .with_animal("Goat", 4000);
        assert!(catalog.has_npc("Leah"));
        assert_eq!(catalog.building("Shed").unwrap().cost, 15000);
        assert!(catalog.has_tool("Hoe"));
        assert_eq!(catalog.animal("Goat").unwrap().price, 4000);
    }

    #[test]
    fn test_load_missing_file() {
        let result = StaticCatalog::load("/nonexistent/catalog.yml");
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
