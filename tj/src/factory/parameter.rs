//! Parameter descriptors and validation

use std::fmt;

use bitflags::bitflags;

use super::FactoryError;
use crate::catalog::Catalog;
use crate::domain::ItemCategory;
use crate::task::split_flavored;

bitflags! {
    /// Validation rules applied to a parameter value
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Constraint: u16 {
        /// Value must be present (non-empty text or list)
        const NOT_EMPTY = 1 << 0;
        /// Number must be zero or greater
        const GE0 = 1 << 1;
        /// Number must be one or greater
        const GE1 = 1 << 2;
        /// Every item id must exist in the catalog
        const ITEM_ID = 1 << 3;
        /// Every item id must be a regular object
        const SOBJECT = 1 << 4;
        /// Text must name a known NPC
        const NPC = 1 << 5;
        /// Text must name a known building
        const BUILDING = 1 << 6;
        /// Text must name an upgradable tool
        const TOOL = 1 << 7;
        /// Text must name a known farm animal
        const ANIMAL = 1 << 8;
    }
}

/// What kind of domain object a parameter selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamTag {
    ItemList,
    NpcName,
    Building,
    Animal,
    Tool,
    Count,
    Cost,
    Text,
}

impl ParamTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamTag::ItemList => "item-list",
            ParamTag::NpcName => "npc",
            ParamTag::Building => "building",
            ParamTag::Animal => "animal",
            ParamTag::Tool => "tool",
            ParamTag::Count => "count",
            ParamTag::Cost => "cost",
            ParamTag::Text => "text",
        }
    }

    /// Whether values for this tag are numbers
    pub fn is_numeric(self) -> bool {
        matches!(self, ParamTag::Count | ParamTag::Cost)
    }
}

impl fmt::Display for ParamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value being edited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParamValue {
    #[default]
    Empty,
    Text(String),
    Number(i64),
    Items(Vec<String>),
}

impl ParamValue {
    /// Parse user input for a parameter with the given tag
    ///
    /// Item lists are comma separated; numeric tags must parse as integers.
    pub fn parse(tag: ParamTag, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Some(ParamValue::Empty);
        }
        match tag {
            ParamTag::ItemList => Some(ParamValue::Items(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            ParamTag::Count | ParamTag::Cost => raw.parse().ok().map(ParamValue::Number),
            _ => Some(ParamValue::Text(raw.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Empty => true,
            ParamValue::Text(s) => s.trim().is_empty(),
            ParamValue::Number(_) => false,
            ParamValue::Items(items) => items.is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[String]> {
        match self {
            ParamValue::Items(items) => Some(items),
            _ => None,
        }
    }

    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            ParamValue::Empty
        } else {
            ParamValue::Text(text.to_string())
        }
    }

    pub fn from_items(items: &[String]) -> Self {
        if items.is_empty() {
            ParamValue::Empty
        } else {
            ParamValue::Items(items.to_vec())
        }
    }

    pub fn from_number(n: Option<i64>) -> Self {
        n.map_or(ParamValue::Empty, ParamValue::Number)
    }

    /// Text for `param`; empty values clear it
    pub fn into_text(self, param: &TaskParameter) -> Result<String, FactoryError> {
        match self {
            ParamValue::Empty => Ok(String::new()),
            ParamValue::Text(s) => Ok(s),
            _ => Err(param.wrong_type()),
        }
    }

    pub fn into_items(self, param: &TaskParameter) -> Result<Vec<String>, FactoryError> {
        match self {
            ParamValue::Empty => Ok(Vec::new()),
            ParamValue::Items(items) => Ok(items),
            ParamValue::Text(s) => Ok(vec![s]),
            ParamValue::Number(_) => Err(param.wrong_type()),
        }
    }

    pub fn into_number(self, param: &TaskParameter) -> Result<Option<i64>, FactoryError> {
        match self {
            ParamValue::Empty => Ok(None),
            ParamValue::Number(n) => Ok(Some(n)),
            _ => Err(param.wrong_type()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Empty => Ok(()),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Items(items) => f.write_str(&items.join(",")),
        }
    }
}

/// One configurable field of a task kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskParameter {
    pub name: &'static str,
    pub tag: ParamTag,
    pub required: bool,
    /// Hidden parameters are set programmatically and never validated
    pub hidden: bool,
    pub constraints: Constraint,
}

impl TaskParameter {
    /// Required, visible and non-empty by default
    pub const fn new(name: &'static str, tag: ParamTag) -> Self {
        Self {
            name,
            tag,
            required: true,
            hidden: false,
            constraints: Constraint::NOT_EMPTY,
        }
    }

    pub const fn constraints(mut self, constraints: Constraint) -> Self {
        self.constraints = constraints;
        self
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    fn wrong_type(&self) -> FactoryError {
        FactoryError::WrongType {
            name: self.name,
            expected: self.tag,
        }
    }

    /// Whether `value` satisfies every constraint of this parameter
    pub fn is_valid(&self, value: &ParamValue, catalog: &dyn Catalog) -> bool {
        let c = self.constraints;
        if value.is_empty() {
            return !c.contains(Constraint::NOT_EMPTY) && !c.intersects(Constraint::GE0 | Constraint::GE1);
        }

        if c.intersects(Constraint::GE0 | Constraint::GE1) {
            let Some(n) = value.as_number() else {
                return false;
            };
            if (c.contains(Constraint::GE0) && n < 0) || (c.contains(Constraint::GE1) && n < 1) {
                return false;
            }
        }

        if c.intersects(Constraint::ITEM_ID | Constraint::SOBJECT) {
            let Some(items) = value.as_items() else {
                return false;
            };
            for id in items {
                let (base, ingredient) = split_flavored(id);
                let Some(info) = catalog.item(base) else {
                    return false;
                };
                if c.contains(Constraint::SOBJECT) && info.category != ItemCategory::Object {
                    return false;
                }
                if let Some(ingredient) = ingredient
                    && catalog.item(ingredient).is_none()
                {
                    return false;
                }
            }
        }

        let text_checks: [(Constraint, fn(&dyn Catalog, &str) -> bool); 4] = [
            (Constraint::NPC, |cat, s| cat.has_npc(s)),
            (Constraint::BUILDING, |cat, s| cat.building(s).is_some()),
            (Constraint::TOOL, |cat, s| cat.has_tool(s)),
            (Constraint::ANIMAL, |cat, s| cat.animal(s).is_some()),
        ];
        for (flag, check) in text_checks {
            if c.contains(flag) {
                match value.as_text() {
                    Some(text) if check(catalog, text) => {}
                    _ => return false,
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemInfo, StaticCatalog};

    fn catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with_item(ItemInfo {
                id: "(O)24".to_string(),
                name: "Parsnip".to_string(),
                category: ItemCategory::Object,
                price: 40,
                sell_price: 35,
            })
            .with_item(ItemInfo {
                id: "(BC)10".to_string(),
                name: "Bee House".to_string(),
                category: ItemCategory::BigCraftable,
                price: 0,
                sell_price: 0,
            })
            .with_npc("Abigail")
            .with_building("Coop", 4000)
            .with_tool("Axe")
            .with_animal("Goat", 4000)
    }

    #[test]
    fn test_defaults() {
        let param = TaskParameter::new("item", ParamTag::ItemList);
        assert!(param.required);
        assert!(!param.hidden);
        assert_eq!(param.constraints, Constraint::NOT_EMPTY);
    }

    #[test]
    fn test_not_empty() {
        let catalog = catalog();
        let param = TaskParameter::new("label", ParamTag::Text);
        assert!(!param.is_valid(&ParamValue::Empty, &catalog));
        assert!(!param.is_valid(&ParamValue::Text("  ".to_string()), &catalog));
        assert!(param.is_valid(&ParamValue::Text("hi".to_string()), &catalog));
    }

    #[test]
    fn test_numeric_bounds() {
        let catalog = catalog();
        let ge1 = TaskParameter::new("count", ParamTag::Count).constraints(Constraint::GE1);
        assert!(!ge1.is_valid(&ParamValue::Number(0), &catalog));
        assert!(ge1.is_valid(&ParamValue::Number(1), &catalog));
        assert!(!ge1.is_valid(&ParamValue::Empty, &catalog));
        assert!(!ge1.is_valid(&ParamValue::Text("1".to_string()), &catalog));

        let ge0 = TaskParameter::new("cost", ParamTag::Cost).constraints(Constraint::GE0);
        assert!(ge0.is_valid(&ParamValue::Number(0), &catalog));
        assert!(!ge0.is_valid(&ParamValue::Number(-1), &catalog));
    }

    #[test]
    fn test_item_constraints() {
        let catalog = catalog();
        let item_id = TaskParameter::new("item", ParamTag::ItemList)
            .constraints(Constraint::ITEM_ID.union(Constraint::NOT_EMPTY));
        let items = |ids: &[&str]| ParamValue::Items(ids.iter().map(|s| s.to_string()).collect());

        assert!(!item_id.is_valid(&items(&[]), &catalog));
        assert!(item_id.is_valid(&items(&["(O)24"]), &catalog));
        assert!(item_id.is_valid(&items(&["(BC)10"]), &catalog));
        assert!(!item_id.is_valid(&items(&["(O)999"]), &catalog));
        assert!(!item_id.is_valid(&items(&["(O)24|(O)999"]), &catalog));

        let sobject = TaskParameter::new("item", ParamTag::ItemList).constraints(Constraint::SOBJECT);
        assert!(sobject.is_valid(&items(&["(O)24"]), &catalog));
        assert!(!sobject.is_valid(&items(&["(BC)10"]), &catalog));
        assert!(sobject.is_valid(&ParamValue::Empty, &catalog));
    }

    #[test]
    fn test_named_constraints() {
        let catalog = catalog();
        let text = |s: &str| ParamValue::Text(s.to_string());
        let npc = TaskParameter::new("npc", ParamTag::NpcName).constraints(Constraint::NPC);
        assert!(npc.is_valid(&text("Abigail"), &catalog));
        assert!(!npc.is_valid(&text("Nobody"), &catalog));

        let building = TaskParameter::new("building", ParamTag::Building).constraints(Constraint::BUILDING);
        assert!(building.is_valid(&text("Coop"), &catalog));
        assert!(!building.is_valid(&text("Castle"), &catalog));

        let tool = TaskParameter::new("tool", ParamTag::Tool).constraints(Constraint::TOOL);
        assert!(tool.is_valid(&text("Axe"), &catalog));

        let animal = TaskParameter::new("animal", ParamTag::Animal).constraints(Constraint::ANIMAL);
        assert!(animal.is_valid(&text("Goat"), &catalog));
        assert!(!animal.is_valid(&text("Dragon"), &catalog));
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(
            ParamValue::parse(ParamTag::ItemList, "(O)24, (O)190"),
            Some(ParamValue::Items(vec!["(O)24".to_string(), "(O)190".to_string()]))
        );
        assert_eq!(ParamValue::parse(ParamTag::Count, "3"), Some(ParamValue::Number(3)));
        assert_eq!(ParamValue::parse(ParamTag::Count, "three"), None);
        assert_eq!(ParamValue::parse(ParamTag::NpcName, ""), Some(ParamValue::Empty));
        assert_eq!(
            ParamValue::parse(ParamTag::Building, "Big Coop"),
            Some(ParamValue::Text("Big Coop".to_string()))
        );
    }
}
