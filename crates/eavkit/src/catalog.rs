//! The host catalog, as seen by the attribute layer.
//!
//! Items and categories belong to the host application. The attribute layer
//! only needs to know which categories an item is in; [`CategoryProvider`] is
//! that seam. [`StaticCatalog`] is a map-backed provider for tests and the CLI.

use crate::error::Result;
use crate::model::{CatalogItem, CategoryId, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub trait CategoryProvider {
    /// Current categories of `item`; an unknown item has none.
    fn categories_of(&self, item: &ItemId) -> Result<BTreeSet<CategoryId>>;

    fn item(&self, item: &ItemId) -> Result<CatalogItem> {
        Ok(CatalogItem::new(item.clone(), self.categories_of(item)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCatalog {
    items: BTreeMap<ItemId, BTreeSet<CategoryId>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: impl Into<ItemId>, categories: BTreeSet<CategoryId>) -> Self {
        self.insert(item, categories);
        self
    }

    pub fn insert(&mut self, item: impl Into<ItemId>, categories: BTreeSet<CategoryId>) {
        self.items.insert(item.into(), categories);
    }
}

impl CategoryProvider for StaticCatalog {
    fn categories_of(&self, item: &ItemId) -> Result<BTreeSet<CategoryId>> {
        Ok(self.items.get(item).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category_set;

    #[test]
    fn unknown_item_has_no_categories() {
        let catalog = StaticCatalog::new();
        assert!(catalog.categories_of(&ItemId::new("x")).unwrap().is_empty());
    }

    #[test]
    fn item_carries_categories() {
        let mut catalog = StaticCatalog::new()
            .with_item("sneaker-1", category_set(["shoes"]))
            .with_item("boot-1", category_set(["shoes", "winter"]));

        let item = catalog.item(&ItemId::new("boot-1")).unwrap();
        assert_eq!(item.id, ItemId::new("boot-1"));
        assert_eq!(item.categories, category_set(["shoes", "winter"]));

        catalog.insert("boot-1", category_set(["winter"]));
        assert_eq!(
            catalog.categories_of(&ItemId::new("boot-1")).unwrap(),
            category_set(["winter"])
        );
    }
}
