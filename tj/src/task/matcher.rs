//! Item id matching with flavored ids
//!
//! A task's item list holds qualified item ids. An entry may name a flavored
//! item as `"<base id>|<ingredient id>"` (e.g. `(O)348|(O)254` for melon wine);
//! such an item only matches when its preserved parent is the ingredient.

use crate::domain::Item;

pub const FLAVOR_SEPARATOR: char = '|';

/// Split an entry into its base id and optional ingredient id
pub fn split_flavored(id: &str) -> (&str, Option<&str>) {
    match id.split_once(FLAVOR_SEPARATOR) {
        Some((base, ingredient)) if !ingredient.is_empty() => (base, Some(ingredient)),
        Some((base, _)) => (base, None),
        None => (id, None),
    }
}

/// Compiled form of a task's item id list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMatcher {
    base_ids: Vec<String>,
    ingredient: Option<String>,
}

impl ItemMatcher {
    /// Build from raw entries; the first ingredient found applies to all
    pub fn new(ids: &[String]) -> Self {
        let mut base_ids = Vec::with_capacity(ids.len());
        let mut ingredient = None;
        for id in ids {
            let (base, flavor) = split_flavored(id);
            if !base_ids.iter().any(|b| b == base) {
                base_ids.push(base.to_string());
            }
            if ingredient.is_none() {
                ingredient = flavor.map(str::to_string);
            }
        }
        Self { base_ids, ingredient }
    }

    pub fn is_empty(&self) -> bool {
        self.base_ids.is_empty()
    }

    pub fn base_ids(&self) -> &[String] {
        &self.base_ids
    }

    pub fn ingredient(&self) -> Option<&str> {
        self.ingredient.as_deref()
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.base_ids.iter().any(|id| *id == item.qualified_id)
            && match &self.ingredient {
                Some(ingredient) => item.preserved_parent_id.as_deref() == Some(ingredient.as_str()),
                None => true,
            }
    }
}
