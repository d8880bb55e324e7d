//! Row types and identifiers shared by the store, the accessor and the forms.
//!
//! Attribute definitions live in [`crate::attributes::spec`]; this module holds the
//! two other tables (options and values) plus the identifiers of the external
//! catalog entities (items and categories) that the attribute layer references
//! but does not own.

use crate::attributes::AttrValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

pub type AttributeId = Uuid;
pub type OptionId = Uuid;
pub type ValueId = Uuid;

/// Reference to a catalog item owned by the host application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Reference to a catalog category owned by the host application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Builds a category set from anything string-like. Mostly a test and CLI convenience.
pub fn category_set<I, S>(categories: I) -> BTreeSet<CategoryId>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    categories.into_iter().map(CategoryId::new).collect()
}

/// The attribute layer's view of a catalog item: its id and current categories.
///
/// The host owns the item itself; this is the composition point the accessor
/// and the forms hang off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: ItemId,
    pub categories: BTreeSet<CategoryId>,
}

impl CatalogItem {
    pub fn new(id: impl Into<ItemId>, categories: BTreeSet<CategoryId>) -> Self {
        Self {
            id: id.into(),
            categories,
        }
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One allowed choice of a Select attribute.
///
/// `(attribute, name)` is unique; see [`crate::store::AttrStore::get_or_create_option`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOption {
    pub id: OptionId,
    pub attribute: AttributeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl AttributeOption {
    pub fn new(attribute: AttributeId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            attribute,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// The stored value of one attribute for one item.
///
/// Absence of a row is the "no value" state; a row never holds an empty value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    pub id: ValueId,
    pub item: ItemId,
    pub attribute: AttributeId,
    pub value: AttrValue,
    pub updated_at: DateTime<Utc>,
}

impl ValueRow {
    pub fn new(item: ItemId, attribute: AttributeId, value: AttrValue) -> Self {
        Self {
            id: Uuid::new_v4(),
            item,
            attribute,
            value,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_set_dedupes_and_orders() {
        let set = category_set(["shoes", "boots", "shoes"]);
        let names: Vec<&str> = set.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["boots", "shoes"]);
    }

    #[test]
    fn item_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ItemId::new("sneaker-1")).unwrap();
        assert_eq!(json, "\"sneaker-1\"");
    }

    #[test]
    fn value_row_serialization_roundtrip() {
        let row = ValueRow::new(
            ItemId::new("sneaker-1"),
            Uuid::new_v4(),
            AttrValue::Integer(42),
        );
        let json = serde_json::to_string(&row).unwrap();
        let loaded: ValueRow = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, row);
    }
}
