//! # Storage Layer
//!
//! This module defines the storage abstraction for attribute data. The
//! [`AttrStore`] trait is what the accessor, the forms and the filter engine
//! talk to; [`StorageBackend`](backend::StorageBackend) implementations only
//! move bytes.
//!
//! ## Tables
//!
//! Three logical tables, kept together in [`tables::Tables`]:
//!
//! ```text
//! attributes (id, name, code UNIQUE, kind, is_required, is_visible, is_filterable, categories)
//! options    (id, attribute -> attributes, name, UNIQUE(attribute, name))
//! values     (id, item, attribute -> attributes, value, UNIQUE(item, attribute))
//! ```
//!
//! `categories` on a definition is the many-to-many join with the host's
//! category table. Constraints are enforced by `Tables` itself, not by callers.
//!
//! ## Transactions
//!
//! Every mutation runs as one transaction: take the store's write lock, load a
//! working copy of the tables, apply the change, save once. Any error before the
//! save drops the working copy, so a failed submission leaves no trace.
//! Category-change purges and the following value writes share a transaction
//! (see [`AttrStore::commit_values`]).
//!
//! ## Option Get-or-Create
//!
//! `get_or_create_option` reads first, inserts when absent and, when the insert
//! hits the `(attribute, name)` constraint because another writer got there
//! first, re-reads exactly once and returns the winner's row.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryStore`]: for tests; shareable across threads.
//! - [`fs::FileStore`]: one `attributes.json` per data directory, written atomically.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! └── attributes.json     # attributes, options and values
//! ```

use crate::attributes::{AttrValue, AttributeDefinition, AttributeDraft};
use crate::error::Result;
use crate::model::{AttributeId, AttributeOption, CategoryId, ItemId, OptionId, ValueRow};
use serde::Serialize;
use std::collections::BTreeSet;

pub mod backend;
pub mod eav_store;
pub mod fs;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;
pub mod tables;

pub use tables::CascadeReport;

/// Which of an item's values to drop before committing new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purge {
    /// Every value of the item.
    All,
    /// Every value except those of the listed attributes.
    Except(BTreeSet<AttributeId>),
}

/// One staged write: `None` (or a blank value) deletes the row.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub attribute: AttributeId,
    pub value: Option<AttrValue>,
}

impl ValueChange {
    pub fn set(attribute: AttributeId, value: AttrValue) -> Self {
        Self {
            attribute,
            value: Some(value),
        }
    }

    pub fn clear(attribute: AttributeId) -> Self {
        Self {
            attribute,
            value: None,
        }
    }
}

/// What a commit did to the value table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// Rows inserted or updated
    pub written: usize,
    /// Rows deleted because the new value was empty
    pub deleted: usize,
    /// Rows dropped by a category-change purge
    pub purged: usize,
    /// Changes that matched what was already stored
    pub unchanged: usize,
}

/// Abstract interface for attribute storage.
///
/// Methods take `&self`; implementations synchronize internally so one store
/// can serve concurrent requests.
pub trait AttrStore {
    // --- Definitions ---

    /// Get a definition by id
    fn get_attribute(&self, id: AttributeId) -> Result<AttributeDefinition>;

    /// Look up a definition by its code
    fn find_by_code(&self, code: &str) -> Result<Option<AttributeDefinition>>;

    /// All definitions, ordered by name
    fn list_attributes(&self) -> Result<Vec<AttributeDefinition>>;

    /// Definitions linked to at least one of `categories`, ordered by name
    fn find_applicable(&self, categories: &BTreeSet<CategoryId>) -> Result<Vec<AttributeDefinition>>;

    /// Definitions linked to a single category (administrative scoping)
    fn attributes_for_category(&self, category: &CategoryId) -> Result<Vec<AttributeDefinition>> {
        let categories = BTreeSet::from([category.clone()]);
        self.find_applicable(&categories)
    }

    /// Create or update a definition.
    ///
    /// Derives the code from the name when blank; fails with a validation error
    /// on an empty name, a malformed or duplicate code, or a code/kind change
    /// on a definition that already has stored values.
    fn save_attribute(&self, draft: AttributeDraft) -> Result<AttributeDefinition>;

    /// Delete a definition with its options and values
    fn delete_attribute(&self, id: AttributeId) -> Result<CascadeReport>;

    // --- Options ---

    /// Return the `(attribute, label)` option, creating it if absent
    fn get_or_create_option(&self, attribute: AttributeId, label: &str) -> Result<AttributeOption>;

    /// Options of a Select attribute, in creation order
    fn list_options(&self, attribute: AttributeId) -> Result<Vec<AttributeOption>>;

    fn get_option(&self, id: OptionId) -> Result<AttributeOption>;

    /// Delete an option and the values selecting it; returns the cascaded value count
    fn delete_option(&self, id: OptionId) -> Result<usize>;

    // --- Values ---

    /// The stored value, or `None` when the item has no row for the attribute
    fn get_value(&self, item: &ItemId, attribute: AttributeId) -> Result<Option<AttrValue>>;

    /// All rows of one item
    fn item_values(&self, item: &ItemId) -> Result<Vec<ValueRow>>;

    /// Rows for any of `attributes` × any of `items`, in insertion order
    fn values_for(&self, attributes: &[AttributeId], items: &[ItemId]) -> Result<Vec<ValueRow>>;

    /// Apply an optional purge and then `changes`, all in one transaction.
    fn commit_values(
        &self,
        item: &ItemId,
        purge: Option<&Purge>,
        changes: &[ValueChange],
    ) -> Result<CommitReport>;

    /// Drop every value of an item; returns the number of rows removed
    fn purge_item(&self, item: &ItemId) -> Result<usize> {
        Ok(self.commit_values(item, Some(&Purge::All), &[])?.purged)
    }

    /// Cascade for a deleted catalog item
    fn delete_item(&self, item: &ItemId) -> Result<usize> {
        self.purge_item(item)
    }
}
