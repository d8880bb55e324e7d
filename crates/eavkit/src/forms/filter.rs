//! Listing filter form.
//!
//! One multi-choice field per attribute, keyed `attr_<code>`. Choices are only
//! the options that occur among the candidate items (see
//! [`available_options`]), so an empty form is offered until
//! [`FilterForm::set_options`] runs.

use super::{Choice, FieldDescriptor, FormData, Widget};
use crate::attributes::{available_options, AttributeDefinition, FilterSelection};
use crate::error::{FieldErrorKind, Result, ValidationErrors};
use crate::model::{ItemId, OptionId};
use crate::store::AttrStore;

#[derive(Debug, Clone)]
pub struct FilterForm {
    attributes: Vec<AttributeDefinition>,
    fields: Vec<FieldDescriptor>,
}

impl FilterForm {
    pub fn new(attributes: Vec<AttributeDefinition>) -> Self {
        let fields = attributes
            .iter()
            .map(|a| FieldDescriptor::new(a.field_key(), a.name.clone(), Widget::CheckboxSelectMultiple))
            .collect();
        Self { attributes, fields }
    }

    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Offer, per attribute, the options used by `items`.
    pub fn set_options<S: AttrStore>(&mut self, store: &S, items: &[ItemId]) -> Result<()> {
        let available = available_options(store, &self.attributes, items)?;
        for (field, group) in self.fields.iter_mut().zip(available) {
            field.choices = group.options.iter().map(Choice::from).collect();
        }
        Ok(())
    }

    /// Parse a submission into a selection. Values must be offered choices.
    pub fn selection(&self, data: &FormData) -> std::result::Result<FilterSelection, ValidationErrors> {
        let mut selection = FilterSelection::new();
        let mut errors = ValidationErrors::new();

        for (attribute, field) in self.attributes.iter().zip(&self.fields) {
            for raw in data.get_all(&field.key) {
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                match raw.parse::<OptionId>() {
                    Ok(option) if field.has_choice(&option.to_string()) => {
                        selection.insert(attribute.id, option);
                    }
                    _ => errors.add(
                        field.key.clone(),
                        FieldErrorKind::InvalidChoice {
                            value: raw.to_string(),
                        },
                    ),
                }
            }
        }

        errors.into_result()?;
        Ok(selection)
    }

    /// Parse `data` and narrow `items` with it.
    pub fn apply<S: AttrStore>(&self, store: &S, data: &FormData, items: &[ItemId]) -> Result<Vec<ItemId>> {
        let selection = self.selection(data)?;
        selection.apply(store, items)
    }
}
