//! Per-item attribute access.
//!
//! An [`AttributeAccessor`] is built next to a catalog item and exposes the
//! item's applicable attributes as virtual fields, addressed by code:
//!
//! - `get` reads the staged value if there is one, else the stored value
//! - `set` / `set_raw` stage a write; nothing is persisted
//! - `set_categories` records a category change and schedules the purge
//! - `save` commits the purge and every staged write in one transaction
//!
//! Construction does no I/O. Stored values are loaded on the first read and the
//! applicable set is memoized per category set.
//!
//! ## Category Changes
//!
//! With [`InvalidationPolicy::All`] a category change purges every stored value
//! of the item on the next save; writes staged before the change are dropped,
//! writes staged after it are committed after the purge. With
//! [`InvalidationPolicy::Inapplicable`] only values whose attribute left the
//! applicable set are purged, and only those staged writes are dropped.

use crate::applicable::{ApplicableCache, ApplicableSet};
use crate::attributes::{check_kind, coerce, AttrValue, AttributeDefinition};
use crate::error::{EavError, FieldErrorKind, Result, ValidationErrors};
use crate::model::{AttributeId, CatalogItem, CategoryId, ItemId, OptionId};
use crate::store::{AttrStore, CommitReport, Purge, ValueChange};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

/// Which stored values a category change invalidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationPolicy {
    /// Every value of the item; values must be re-entered.
    #[default]
    All,
    /// Only values of attributes that are no longer applicable.
    Inapplicable,
}

impl fmt::Display for InvalidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationPolicy::All => f.write_str("all"),
            InvalidationPolicy::Inapplicable => f.write_str("inapplicable"),
        }
    }
}

pub struct AttributeAccessor<'s, S: AttrStore> {
    store: &'s S,
    item: ItemId,
    categories: BTreeSet<CategoryId>,
    /// Categories as of construction or the last save
    saved_categories: BTreeSet<CategoryId>,
    applicable: ApplicableCache,
    /// `None` stages a delete
    staged: BTreeMap<AttributeId, Option<AttrValue>>,
    stored: OnceCell<HashMap<AttributeId, AttrValue>>,
    policy: InvalidationPolicy,
    categories_changed: bool,
}

impl<'s, S: AttrStore> AttributeAccessor<'s, S> {
    pub fn new(store: &'s S, item: &CatalogItem) -> Self {
        Self {
            store,
            item: item.id.clone(),
            categories: item.categories.clone(),
            saved_categories: item.categories.clone(),
            applicable: ApplicableCache::new(),
            staged: BTreeMap::new(),
            stored: OnceCell::new(),
            policy: InvalidationPolicy::default(),
            categories_changed: false,
        }
    }

    pub fn with_policy(mut self, policy: InvalidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &'s S {
        self.store
    }

    pub fn item(&self) -> &ItemId {
        &self.item
    }

    pub fn categories(&self) -> &BTreeSet<CategoryId> {
        &self.categories
    }

    pub fn policy(&self) -> InvalidationPolicy {
        self.policy
    }

    /// Definitions applicable to the item's current categories, ordered by name.
    pub fn applicable(&self) -> Result<ApplicableSet> {
        self.applicable.resolve(self.store, &self.categories)
    }

    /// The applicable definition with `code`, if any.
    pub fn definition(&self, code: &str) -> Result<Option<AttributeDefinition>> {
        Ok(self.applicable()?.iter().find(|d| d.code == code).cloned())
    }

    fn stored(&self) -> Result<&HashMap<AttributeId, AttrValue>> {
        self.stored.get_or_try_init(|| {
            let rows = self.store.item_values(&self.item)?;
            Ok::<_, EavError>(rows.into_iter().map(|r| (r.attribute, r.value)).collect())
        })
    }

    /// Whether a pending purge will drop the stored value of `attribute`.
    fn purged_on_save(&self, attribute: AttributeId) -> Result<bool> {
        if !self.categories_changed {
            return Ok(false);
        }
        Ok(match self.policy {
            InvalidationPolicy::All => true,
            InvalidationPolicy::Inapplicable => {
                !self.applicable()?.iter().any(|d| d.id == attribute)
            }
        })
    }

    /// Current value of an attribute: staged first, then stored.
    pub fn get_by_id(&self, attribute: AttributeId) -> Result<Option<AttrValue>> {
        if let Some(staged) = self.staged.get(&attribute) {
            return Ok(staged.clone());
        }
        if self.purged_on_save(attribute)? {
            return Ok(None);
        }
        Ok(self.stored()?.get(&attribute).cloned())
    }

    /// Current value for `code`. Unknown or inapplicable codes read as absent.
    pub fn get(&self, code: &str) -> Result<Option<AttrValue>> {
        match self.definition(code)? {
            Some(def) => self.get_by_id(def.id),
            None => Ok(None),
        }
    }

    /// Stage a typed value for `code`; `None` or blank text stages a delete.
    pub fn set(&mut self, code: &str, value: Option<AttrValue>) -> Result<()> {
        let def = self
            .definition(code)?
            .ok_or_else(|| EavError::AttributeNotFound(code.to_string()))?;
        if let Some(value) = &value {
            if let Err(error) = check_kind(def.kind, value) {
                let mut errors = ValidationErrors::new();
                errors.add(def.field_key(), FieldErrorKind::Coercion { error });
                return Err(errors.into());
            }
            if let AttrValue::Choice(option) = value {
                if !self.owns_option(&def, *option)? {
                    let mut errors = ValidationErrors::new();
                    errors.add(
                        def.field_key(),
                        FieldErrorKind::InvalidChoice {
                            value: option.to_string(),
                        },
                    );
                    return Err(errors.into());
                }
            }
        }
        self.stage(def.id, value);
        Ok(())
    }

    fn owns_option(&self, def: &AttributeDefinition, option: OptionId) -> Result<bool> {
        match self.store.get_option(option) {
            Ok(found) => Ok(found.attribute == def.id),
            Err(EavError::OptionNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Coerce raw input for `code` and stage it.
    pub fn set_raw(&mut self, code: &str, raw: &str) -> Result<()> {
        let def = self
            .definition(code)?
            .ok_or_else(|| EavError::AttributeNotFound(code.to_string()))?;
        match coerce(def.kind, raw) {
            Ok(value) => self.set(code, value),
            Err(error) => {
                let mut errors = ValidationErrors::new();
                errors.add(def.field_key(), FieldErrorKind::Coercion { error });
                Err(errors.into())
            }
        }
    }

    /// Stage an already-checked value.
    pub(crate) fn stage(&mut self, attribute: AttributeId, value: Option<AttrValue>) {
        let value = value.filter(|v| !matches!(v, AttrValue::Text(s) if s.trim().is_empty()));
        self.staged.insert(attribute, value);
    }

    /// Move the item to a new category set. Takes effect on `save`.
    pub fn set_categories(&mut self, categories: BTreeSet<CategoryId>) -> Result<()> {
        if categories == self.categories {
            return Ok(());
        }
        self.categories = categories;
        self.categories_changed = true;
        self.applicable.invalidate();

        match self.policy {
            InvalidationPolicy::All => self.staged.clear(),
            InvalidationPolicy::Inapplicable => {
                let keep: BTreeSet<AttributeId> =
                    self.applicable()?.iter().map(|d| d.id).collect();
                self.staged.retain(|attribute, _| keep.contains(attribute));
            }
        }
        debug!(item = %self.item, policy = %self.policy, "categories changed");
        Ok(())
    }

    pub fn categories_changed(&self) -> bool {
        self.categories_changed
    }

    pub fn is_dirty(&self) -> bool {
        self.categories_changed || !self.staged.is_empty()
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Drop staged writes and any pending category change, returning to the
    /// categories of the last save.
    pub fn discard(&mut self) {
        self.staged.clear();
        self.categories_changed = false;
        if self.categories != self.saved_categories {
            self.categories = self.saved_categories.clone();
            self.applicable.invalidate();
        }
    }

    /// Commit the pending purge and the staged writes in one transaction.
    ///
    /// On error nothing is persisted and the staged state is kept, so the
    /// caller can correct and retry.
    pub fn save(&mut self) -> Result<CommitReport> {
        if !self.is_dirty() {
            return Ok(CommitReport::default());
        }

        let purge = if self.categories_changed {
            Some(match self.policy {
                InvalidationPolicy::All => Purge::All,
                InvalidationPolicy::Inapplicable => {
                    Purge::Except(self.applicable()?.iter().map(|d| d.id).collect())
                }
            })
        } else {
            None
        };
        let changes: Vec<ValueChange> = self
            .staged
            .iter()
            .map(|(attribute, value)| ValueChange {
                attribute: *attribute,
                value: value.clone(),
            })
            .collect();

        let report = self
            .store
            .commit_values(&self.item, purge.as_ref(), &changes)?;

        self.staged.clear();
        self.categories_changed = false;
        self.saved_categories = self.categories.clone();
        self.stored = OnceCell::new();
        Ok(report)
    }
}
