//! # API Facade
//!
//! [`AttrsApi`] is the single entry point a host (the CLI, a web handler) uses
//! for attribute work. It wires the store, the configured purge policy and the
//! form options together and returns structured data, never text for a
//! terminal.
//!
//! ## Generic Over AttrStore
//!
//! - Production: `AttrsApi<FileStore>`
//! - Testing: `AttrsApi<InMemoryStore>`
//!
//! ## Editing Flow
//!
//! ```ignore
//! let mut form = api.edit_form_for(&catalog, &item_id)?; // descriptors with initial values
//! form.change_categories(new_categories)?;     // only when the host item moved
//! form.submit(&posted)?;                       // validate, resolve options, commit
//! ```

use crate::accessor::{AttributeAccessor, InvalidationPolicy};
use crate::attributes::{AttrValue, AttributeDefinition, AttributeDraft};
use crate::catalog::CategoryProvider;
use crate::config::EavConfig;
use crate::error::{EavError, Result};
use crate::forms::{EditForm, FilterForm, FormData, FormOptions};
use crate::model::{AttributeOption, CatalogItem, CategoryId, ItemId, OptionId};
use crate::store::{AttrStore, CascadeReport, CommitReport};
use serde::Serialize;
use std::collections::BTreeSet;

/// One visible attribute value, rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayValue {
    pub code: String,
    pub label: String,
    pub text: String,
}

pub struct AttrsApi<S: AttrStore> {
    store: S,
    policy: InvalidationPolicy,
    form_options: FormOptions,
}

impl<S: AttrStore> AttrsApi<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: InvalidationPolicy::default(),
            form_options: FormOptions::default(),
        }
    }

    pub fn with_config(store: S, config: &EavConfig) -> Self {
        Self {
            store,
            policy: config.invalidation,
            form_options: config.form_options(),
        }
    }

    pub fn with_form_options(mut self, options: FormOptions) -> Self {
        self.form_options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn form_options(&self) -> &FormOptions {
        &self.form_options
    }

    // --- Definitions ---

    pub fn create_attribute(&self, draft: AttributeDraft) -> Result<AttributeDefinition> {
        self.store.save_attribute(draft)
    }

    pub fn list_attributes(&self) -> Result<Vec<AttributeDefinition>> {
        self.store.list_attributes()
    }

    pub fn attributes_for_category(&self, category: &CategoryId) -> Result<Vec<AttributeDefinition>> {
        self.store.attributes_for_category(category)
    }

    /// Definition by code; unlike the store lookup, absence is an error here.
    pub fn attribute(&self, code: &str) -> Result<AttributeDefinition> {
        self.store
            .find_by_code(code)?
            .ok_or_else(|| EavError::AttributeNotFound(code.to_string()))
    }

    pub fn delete_attribute(&self, code: &str) -> Result<CascadeReport> {
        let def = self.attribute(code)?;
        self.store.delete_attribute(def.id)
    }

    // --- Options ---

    pub fn add_option(&self, code: &str, label: &str) -> Result<AttributeOption> {
        let def = self.attribute(code)?;
        self.store.get_or_create_option(def.id, label)
    }

    pub fn list_options(&self, code: &str) -> Result<Vec<AttributeOption>> {
        let def = self.attribute(code)?;
        self.store.list_options(def.id)
    }

    pub fn delete_option(&self, id: OptionId) -> Result<usize> {
        self.store.delete_option(id)
    }

    // --- Items ---

    pub fn accessor<'s>(&'s self, item: &CatalogItem) -> AttributeAccessor<'s, S> {
        AttributeAccessor::new(&self.store, item).with_policy(self.policy)
    }

    pub fn edit_form<'s>(&'s self, item: &CatalogItem) -> Result<EditForm<'s, S>> {
        EditForm::new(self.accessor(item), self.form_options.clone())
    }

    /// One full edit submission, optionally moving the item to new categories.
    pub fn submit(
        &self,
        item: &CatalogItem,
        new_categories: Option<BTreeSet<CategoryId>>,
        data: &FormData,
    ) -> Result<CommitReport> {
        let mut form = self.edit_form(item)?;
        if let Some(categories) = new_categories {
            form.change_categories(categories)?;
        }
        form.submit(data)
    }

    /// Edit form for an item whose categories come from the host catalog.
    pub fn edit_form_for<'s>(
        &'s self,
        catalog: &impl CategoryProvider,
        item: &ItemId,
    ) -> Result<EditForm<'s, S>> {
        self.edit_form(&catalog.item(item)?)
    }

    /// [`AttrsApi::submit`] for an item looked up in the host catalog.
    pub fn submit_for(
        &self,
        catalog: &impl CategoryProvider,
        item: &ItemId,
        new_categories: Option<BTreeSet<CategoryId>>,
        data: &FormData,
    ) -> Result<CommitReport> {
        self.submit(&catalog.item(item)?, new_categories, data)
    }

    pub fn display_values_for(
        &self,
        catalog: &impl CategoryProvider,
        item: &ItemId,
    ) -> Result<Vec<DisplayValue>> {
        self.display_values(&catalog.item(item)?)
    }

    /// Stored values of visible attributes, in attribute name order.
    pub fn display_values(&self, item: &CatalogItem) -> Result<Vec<DisplayValue>> {
        let accessor = self.accessor(item);
        let mut shown = Vec::new();
        for def in accessor.applicable()?.iter().filter(|d| d.is_visible) {
            let Some(value) = accessor.get_by_id(def.id)? else {
                continue;
            };
            shown.push(DisplayValue {
                code: def.code.clone(),
                label: def.name.clone(),
                text: self.render(&value)?,
            });
        }
        Ok(shown)
    }

    fn render(&self, value: &AttrValue) -> Result<String> {
        Ok(match value {
            AttrValue::Bool(b) => self.form_options.localizer.yes_no(*b),
            AttrValue::Choice(id) => self.store.get_option(*id)?.name,
            other => other.to_input(),
        })
    }

    /// Filter form over the filterable attributes of `categories`, offering
    /// only the options used by `items`.
    pub fn filter_form(&self, categories: &BTreeSet<CategoryId>, items: &[ItemId]) -> Result<FilterForm> {
        let attributes = self
            .store
            .find_applicable(categories)?
            .into_iter()
            .filter(|d| d.is_filterable && d.has_options())
            .collect();
        let mut form = FilterForm::new(attributes);
        form.set_options(&self.store, items)?;
        Ok(form)
    }

    pub fn filter(
        &self,
        categories: &BTreeSet<CategoryId>,
        items: &[ItemId],
        data: &FormData,
    ) -> Result<Vec<ItemId>> {
        self.filter_form(categories, items)?
            .apply(&self.store, data, items)
    }

    /// Cascade for an item the host deleted.
    pub fn delete_item(&self, item: &ItemId) -> Result<usize> {
        self.store.delete_item(item)
    }
}
