//! The three attribute tables and their integrity constraints.
//!
//! Every write path goes through a method here, so the constraints hold no
//! matter which backend persisted the rows:
//!
//! - `attributes.code` UNIQUE
//! - `options (attribute, name)` UNIQUE, `options.attribute` references an existing Select attribute
//! - `values (item, attribute)` UNIQUE, `values.attribute` references an existing attribute,
//!   the value variant matches the attribute kind, and a `Choice` names an option of the same attribute
//!
//! Deleting a definition cascades to its options and values; deleting an option
//! cascades to the values selecting it.

use crate::attributes::{AttrValue, AttributeDefinition};
use crate::error::{IntegrityViolation, Result};
use crate::model::{AttributeId, AttributeOption, ItemId, OptionId, ValueRow};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub(crate) attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub(crate) options: Vec<AttributeOption>,
    #[serde(default)]
    pub(crate) values: Vec<ValueRow>,
}

/// Rows removed by a cascading delete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub options: usize,
    pub values: usize,
}

/// Outcome of [`Tables::upsert_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

impl Tables {
    // --- Attributes ---

    pub fn attribute(&self, id: AttributeId) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.id == id)
    }

    pub fn attribute_by_code(&self, code: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.code == code)
    }

    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    /// Insert or replace a definition, enforcing code uniqueness.
    pub fn put_attribute(&mut self, def: AttributeDefinition) -> Result<()> {
        if let Some(other) = self.attribute_by_code(&def.code) {
            if other.id != def.id {
                return Err(IntegrityViolation::DuplicateCode(def.code).into());
            }
        }
        match self.attributes.iter_mut().find(|a| a.id == def.id) {
            Some(existing) => *existing = def,
            None => self.attributes.push(def),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: AttributeId) -> Option<CascadeReport> {
        let before = self.attributes.len();
        self.attributes.retain(|a| a.id != id);
        if self.attributes.len() == before {
            return None;
        }

        let options_before = self.options.len();
        self.options.retain(|o| o.attribute != id);
        let values_before = self.values.len();
        self.values.retain(|v| v.attribute != id);

        Some(CascadeReport {
            options: options_before - self.options.len(),
            values: values_before - self.values.len(),
        })
    }

    /// Whether any stored value references the attribute.
    pub fn is_referenced(&self, id: AttributeId) -> bool {
        self.values.iter().any(|v| v.attribute == id)
    }

    // --- Options ---

    pub fn option(&self, id: OptionId) -> Option<&AttributeOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn option_by_name(&self, attribute: AttributeId, name: &str) -> Option<&AttributeOption> {
        self.options
            .iter()
            .find(|o| o.attribute == attribute && o.name == name)
    }

    pub fn options_for(&self, attribute: AttributeId) -> impl Iterator<Item = &AttributeOption> {
        self.options.iter().filter(move |o| o.attribute == attribute)
    }

    pub fn insert_option(&mut self, option: AttributeOption) -> Result<()> {
        let attribute = self
            .attribute(option.attribute)
            .ok_or(IntegrityViolation::MissingAttribute(option.attribute))?;
        if !attribute.has_options() {
            return Err(IntegrityViolation::KindMismatch(option.attribute).into());
        }
        if self.option_by_name(option.attribute, &option.name).is_some() {
            return Err(IntegrityViolation::DuplicateOption {
                attribute: option.attribute,
                name: option.name,
            }
            .into());
        }
        self.options.push(option);
        Ok(())
    }

    /// Remove an option and every value selecting it. Returns the number of
    /// cascaded values, or `None` when the option did not exist.
    pub fn remove_option(&mut self, id: OptionId) -> Option<usize> {
        let before = self.options.len();
        self.options.retain(|o| o.id != id);
        if self.options.len() == before {
            return None;
        }
        let values_before = self.values.len();
        self.values
            .retain(|v| !matches!(v.value, AttrValue::Choice(option) if option == id));
        Some(values_before - self.values.len())
    }

    // --- Values ---

    pub fn value(&self, item: &ItemId, attribute: AttributeId) -> Option<&ValueRow> {
        self.values
            .iter()
            .find(|v| v.attribute == attribute && &v.item == item)
    }

    pub fn item_values(&self, item: &ItemId) -> impl Iterator<Item = &ValueRow> {
        let item = item.clone();
        self.values.iter().filter(move |v| v.item == item)
    }

    /// Rows for any of `attributes` × any of `items`, in insertion order.
    pub fn values_for(&self, attributes: &[AttributeId], items: &[ItemId]) -> Vec<&ValueRow> {
        let attributes: HashSet<&AttributeId> = attributes.iter().collect();
        let items: HashSet<&ItemId> = items.iter().collect();
        self.values
            .iter()
            .filter(|v| attributes.contains(&v.attribute) && items.contains(&v.item))
            .collect()
    }

    fn check_value(&self, attribute: AttributeId, value: &AttrValue) -> Result<()> {
        let def = self
            .attribute(attribute)
            .ok_or(IntegrityViolation::MissingAttribute(attribute))?;
        if !value.fits(def.kind) {
            return Err(IntegrityViolation::KindMismatch(attribute).into());
        }
        if let AttrValue::Choice(option) = value {
            match self.option(*option) {
                Some(o) if o.attribute == attribute => {}
                _ => {
                    return Err(IntegrityViolation::ForeignOption {
                        attribute,
                        option: *option,
                    }
                    .into())
                }
            }
        }
        Ok(())
    }

    /// Insert, or update on (item, attribute) conflict.
    pub fn upsert_value(
        &mut self,
        item: &ItemId,
        attribute: AttributeId,
        value: AttrValue,
    ) -> Result<Upsert> {
        self.check_value(attribute, &value)?;
        match self
            .values
            .iter_mut()
            .find(|v| v.attribute == attribute && &v.item == item)
        {
            Some(existing) if existing.value == value => Ok(Upsert::Unchanged),
            Some(existing) => {
                existing.value = value;
                existing.updated_at = Utc::now();
                Ok(Upsert::Updated)
            }
            None => {
                self.values
                    .push(ValueRow::new(item.clone(), attribute, value));
                Ok(Upsert::Inserted)
            }
        }
    }

    /// Delete the (item, attribute) row. Deleting a missing row is a no-op.
    pub fn delete_value(&mut self, item: &ItemId, attribute: AttributeId) -> bool {
        let before = self.values.len();
        self.values
            .retain(|v| !(v.attribute == attribute && &v.item == item));
        self.values.len() != before
    }

    /// Delete the item's rows for which `purge` returns true.
    pub fn purge_item_where<F>(&mut self, item: &ItemId, mut purge: F) -> usize
    where
        F: FnMut(AttributeId) -> bool,
    {
        let before = self.values.len();
        self.values
            .retain(|v| !(&v.item == item && purge(v.attribute)));
        before - self.values.len()
    }
}
