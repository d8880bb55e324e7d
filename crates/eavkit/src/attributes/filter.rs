//! Attribute filtering.
//!
//! Listing filters select option ids per attribute. An item passes when, for
//! every attribute with a non-empty selection, one of its stored values picks
//! one of the selected options: OR inside an attribute, AND across attributes.
//!
//! The same value rows also drive the filter UI: [`available_options`] reports
//! only the options that actually occur among the candidate items, so the form
//! never offers a choice with zero matches.

use super::AttrValue;
use super::AttributeDefinition;
use crate::error::Result;
use crate::model::{AttributeId, AttributeOption, ItemId, OptionId, ValueRow};
use crate::store::AttrStore;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Selected options, grouped by attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    groups: BTreeMap<AttributeId, BTreeSet<OptionId>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: select several options of one attribute.
    pub fn select<I>(mut self, attribute: AttributeId, options: I) -> Self
    where
        I: IntoIterator<Item = OptionId>,
    {
        self.groups.entry(attribute).or_default().extend(options);
        self
    }

    pub fn insert(&mut self, attribute: AttributeId, option: OptionId) {
        self.groups.entry(attribute).or_default().insert(option);
    }

    /// True when no attribute has any option selected.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(|g| g.is_empty())
    }

    pub fn selected(&self, attribute: AttributeId) -> Option<&BTreeSet<OptionId>> {
        self.groups.get(&attribute).filter(|g| !g.is_empty())
    }

    fn active_groups(&self) -> impl Iterator<Item = (&AttributeId, &BTreeSet<OptionId>)> {
        self.groups.iter().filter(|(_, g)| !g.is_empty())
    }

    /// Check the stored values of a single item against the selection.
    pub fn matches(&self, values: &[ValueRow]) -> bool {
        self.active_groups().all(|(attribute, options)| {
            values.iter().any(|row| {
                row.attribute == *attribute
                    && matches!(row.value, AttrValue::Choice(id) if options.contains(&id))
            })
        })
    }

    /// Narrow `items` to those passing the selection, keeping candidate order.
    ///
    /// Each attribute group yields the set of item ids that have a matching
    /// value row; the result is the intersection of those sets.
    pub fn apply<S: AttrStore>(&self, store: &S, items: &[ItemId]) -> Result<Vec<ItemId>> {
        if self.is_empty() {
            return Ok(items.to_vec());
        }

        let attributes: Vec<AttributeId> = self.active_groups().map(|(a, _)| *a).collect();
        let rows = store.values_for(&attributes, items)?;

        let mut passing: Option<HashSet<&ItemId>> = None;
        for (attribute, options) in self.active_groups() {
            let hits: HashSet<&ItemId> = rows
                .iter()
                .filter(|row| row.attribute == *attribute)
                .filter(|row| matches!(row.value, AttrValue::Choice(id) if options.contains(&id)))
                .map(|row| &row.item)
                .collect();

            passing = Some(match passing {
                None => hits,
                Some(prev) => prev.intersection(&hits).copied().collect(),
            });
        }

        let passing = passing.unwrap_or_default();
        Ok(items
            .iter()
            .filter(|item| passing.contains(item))
            .cloned()
            .collect())
    }
}

/// Options of one attribute that occur among a set of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableOptions {
    pub attribute: AttributeId,
    pub options: Vec<AttributeOption>,
}

/// Collect, per attribute, the distinct options used by `items`.
///
/// Options keep the order in which they are first seen among the value rows.
/// Attributes without any matching value still get an (empty) entry, in the
/// order they were passed.
pub fn available_options<S: AttrStore>(
    store: &S,
    attributes: &[AttributeDefinition],
    items: &[ItemId],
) -> Result<Vec<AvailableOptions>> {
    let ids: Vec<AttributeId> = attributes.iter().map(|a| a.id).collect();
    let rows = store.values_for(&ids, items)?;

    let mut catalog: HashMap<OptionId, AttributeOption> = HashMap::new();
    for attribute in attributes.iter().filter(|a| a.has_options()) {
        for option in store.list_options(attribute.id)? {
            catalog.insert(option.id, option);
        }
    }

    let mut seen: HashSet<OptionId> = HashSet::new();
    let mut grouped: HashMap<AttributeId, Vec<AttributeOption>> = HashMap::new();
    for row in &rows {
        let AttrValue::Choice(option_id) = row.value else {
            continue;
        };
        if !seen.insert(option_id) {
            continue;
        }
        if let Some(option) = catalog.get(&option_id) {
            grouped
                .entry(row.attribute)
                .or_default()
                .push(option.clone());
        }
    }

    Ok(attributes
        .iter()
        .map(|a| AvailableOptions {
            attribute: a.id,
            options: grouped.remove(&a.id).unwrap_or_default(),
        })
        .collect())
}
