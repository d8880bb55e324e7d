//! Item edit form.
//!
//! ## Field Synthesis
//!
//! For each applicable attribute, in name order:
//! - Select: a selector over the attribute's options, never schema-required,
//!   labelled with the required marker when the attribute is required, followed
//!   by an optional free-text "new value" field
//! - other kinds: a typed input whose `required` flag is the attribute's
//!
//! Initial values come from the accessor (staged over stored).
//!
//! ## Validation
//!
//! Phase 1 coerces every submitted `attr_<code>` field on its own. Phase 2
//! materializes non-empty "new value" entries through get-or-create (the new
//! option wins over the selector) and then checks required attributes. The
//! effective value of an attribute absent from the submission is its current
//! value. All errors are collected; nothing is staged unless the whole
//! submission is valid, and no option is created when phase 1 already failed.

use super::{Choice, FieldDescriptor, FormData, Widget};
use crate::accessor::AttributeAccessor;
use crate::attributes::{coerce, AttrValue, AttributeDefinition};
use crate::error::{EavError, FieldErrorKind, Result, ValidationErrors};
use crate::i18n::{DefaultLocalizer, Localizer};
use crate::model::{AttributeId, CategoryId, OptionId};
use crate::store::{AttrStore, CommitReport};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_REQUIRED_MARKER: &str = " *";

/// Presentation settings shared by the forms of one host.
#[derive(Clone)]
pub struct FormOptions {
    pub required_marker: String,
    pub localizer: Arc<dyn Localizer>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            required_marker: DEFAULT_REQUIRED_MARKER.to_string(),
            localizer: Arc::new(DefaultLocalizer),
        }
    }
}

impl FormOptions {
    pub fn with_required_marker(mut self, marker: impl Into<String>) -> Self {
        self.required_marker = marker.into();
        self
    }

    pub fn with_localizer(mut self, localizer: impl Localizer + 'static) -> Self {
        self.localizer = Arc::new(localizer);
        self
    }

    /// Localized `(field, message)` pairs.
    pub fn messages(&self, errors: &ValidationErrors) -> Vec<(String, String)> {
        errors
            .iter()
            .map(|e| (e.field.clone(), self.localizer.field_error(&e.kind)))
            .collect()
    }
}

pub struct EditForm<'s, S: AttrStore> {
    accessor: AttributeAccessor<'s, S>,
    options: FormOptions,
    fields: Vec<FieldDescriptor>,
}

impl<'s, S: AttrStore> EditForm<'s, S> {
    pub fn new(accessor: AttributeAccessor<'s, S>, options: FormOptions) -> Result<Self> {
        let mut form = Self {
            accessor,
            options,
            fields: Vec::new(),
        };
        form.rebuild()?;
        Ok(form)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn accessor(&self) -> &AttributeAccessor<'s, S> {
        &self.accessor
    }

    pub fn into_accessor(self) -> AttributeAccessor<'s, S> {
        self.accessor
    }

    /// Re-synthesize the descriptors from the current applicable set.
    pub fn rebuild(&mut self) -> Result<()> {
        let defs = self.accessor.applicable()?;
        let store = self.accessor.store();

        let mut fields = Vec::with_capacity(defs.len());
        for def in defs.iter() {
            let initial = self.accessor.get_by_id(def.id)?;
            if def.has_options() {
                let mut label = def.name.clone();
                if def.is_required {
                    label.push_str(&self.options.required_marker);
                }
                let mut selector = FieldDescriptor::new(def.field_key(), label, Widget::Select);
                selector.choices = store.list_options(def.id)?.iter().map(Choice::from).collect();
                selector.initial = initial;
                fields.push(selector);

                fields.push(FieldDescriptor::new(
                    def.new_option_key(),
                    self.options.localizer.new_value_label(&def.name),
                    Widget::TextInput,
                ));
            } else {
                let mut field =
                    FieldDescriptor::new(def.field_key(), def.name.clone(), Widget::for_kind(def.kind));
                field.required = def.is_required;
                field.initial = initial;
                fields.push(field);
            }
        }

        self.fields = fields;
        Ok(())
    }

    /// Move the item to new categories within this submission and rebuild.
    pub fn change_categories(&mut self, categories: BTreeSet<CategoryId>) -> Result<()> {
        self.accessor.set_categories(categories)?;
        self.rebuild()
    }

    /// Validate a submission and, if it is valid, stage its values.
    pub fn validate(&mut self, data: &FormData) -> Result<()> {
        let defs = self.accessor.applicable()?;
        let mut errors = ValidationErrors::new();
        let mut resolved: BTreeMap<AttributeId, Option<AttrValue>> = BTreeMap::new();

        // Phase 1: each field on its own
        for def in defs.iter() {
            let key = def.field_key();
            if !data.contains(&key) {
                continue;
            }
            let raw = data.get(&key).unwrap_or("");
            match coerce(def.kind, raw) {
                Err(error) => errors.add(key, FieldErrorKind::Coercion { error }),
                Ok(Some(AttrValue::Choice(option))) => {
                    if self.owns_option(def, option)? {
                        resolved.insert(def.id, Some(AttrValue::Choice(option)));
                    } else {
                        errors.add(
                            key,
                            FieldErrorKind::InvalidChoice {
                                value: raw.trim().to_string(),
                            },
                        );
                    }
                }
                Ok(value) => {
                    resolved.insert(def.id, value);
                }
            }
        }

        // Phase 2: new options, then required attributes
        let new_labels: Vec<(&AttributeDefinition, &str)> = defs
            .iter()
            .filter(|d| d.has_options())
            .filter_map(|d| {
                data.get(&d.new_option_key())
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(|label| (d, label))
            })
            .collect();

        if errors.is_empty() {
            let store = self.accessor.store();
            for (def, label) in &new_labels {
                let option = store.get_or_create_option(def.id, label)?;
                debug!(attribute = %def.code, option = %option.id, "resolved new option");
                resolved.insert(def.id, Some(AttrValue::Choice(option.id)));
            }
        }

        for def in defs.iter().filter(|d| d.is_required) {
            let key = def.field_key();
            if errors.has_field(&key) {
                continue;
            }
            // A pending new label counts even when phase 1 failed and it was not created
            let has_value = new_labels.iter().any(|(d, _)| d.id == def.id)
                || match resolved.get(&def.id) {
                    Some(value) => value.is_some(),
                    None => self.accessor.get_by_id(def.id)?.is_some(),
                };
            if !has_value {
                errors.add(
                    key,
                    FieldErrorKind::Required {
                        attribute: def.name.clone(),
                    },
                );
            }
        }

        errors.into_result()?;
        for (attribute, value) in resolved {
            self.accessor.stage(attribute, value);
        }
        Ok(())
    }

    fn owns_option(&self, def: &AttributeDefinition, option: OptionId) -> Result<bool> {
        match self.accessor.store().get_option(option) {
            Ok(found) => Ok(found.attribute == def.id),
            Err(EavError::OptionNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Commit the staged values (and any pending category purge).
    pub fn save(&mut self) -> Result<CommitReport> {
        let report = self.accessor.save()?;
        self.rebuild()?;
        Ok(report)
    }

    /// Validate then save.
    pub fn submit(&mut self, data: &FormData) -> Result<CommitReport> {
        self.validate(data)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeDraft, AttributeKind};
    use crate::model::{category_set, CatalogItem, ItemId};
    use crate::store::memory::fixtures::StoreFixture;

    fn fixture() -> StoreFixture {
        StoreFixture::new()
            .with_attribute(
                AttributeDraft::new("Color", AttributeKind::Select)
                    .required()
                    .category("shoes"),
            )
            .with_attribute(AttributeDraft::new("Weight", AttributeKind::Decimal).category("shoes"))
            .with_attribute(
                AttributeDraft::new("Size", AttributeKind::Integer)
                    .required()
                    .category("shoes"),
            )
            .with_attribute(AttributeDraft::new("Lens", AttributeKind::Text).category("glasses"))
            .with_option("color", "Blue")
    }

    fn form(fixture: &StoreFixture) -> EditForm<'_, crate::store::memory::InMemoryStore> {
        let item = CatalogItem::new("sneaker-1", category_set(["shoes"]));
        EditForm::new(
            AttributeAccessor::new(&fixture.store, &item),
            FormOptions::default(),
        )
        .unwrap()
    }

    fn errors_of(err: EavError) -> ValidationErrors {
        match err {
            EavError::Validation(errors) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn synthesizes_fields_in_name_order() {
        let fixture = fixture();
        let form = form(&fixture);
        let keys: Vec<&str> = form.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["attr_color", "option_attr_color", "attr_size", "attr_weight"]
        );
    }

    #[test]
    fn select_fields_defer_required() {
        let fixture = fixture();
        let form = form(&fixture);

        let color = form.field("attr_color").unwrap();
        assert_eq!(color.label, "Color *");
        assert!(!color.required);
        assert_eq!(color.widget, Widget::Select);
        assert_eq!(color.choices.len(), 1);
        assert_eq!(color.choices[0].label, "Blue");

        let new_value = form.field("option_attr_color").unwrap();
        assert_eq!(new_value.label, "Color [New value]");
        assert!(!new_value.required);

        let size = form.field("attr_size").unwrap();
        assert_eq!(size.label, "Size");
        assert!(size.required);
        assert_eq!(size.widget, Widget::NumberInput);
    }

    #[test]
    fn custom_marker_applies() {
        let fixture = fixture();
        let item = CatalogItem::new("sneaker-1", category_set(["shoes"]));
        let form = EditForm::new(
            AttributeAccessor::new(&fixture.store, &item),
            FormOptions::default().with_required_marker(" (required)"),
        )
        .unwrap();
        assert_eq!(form.field("attr_color").unwrap().label, "Color (required)");
    }

    #[test]
    fn initial_values_from_store() {
        let fixture = fixture()
            .with_choice("sneaker-1", "color", "Blue")
            .with_value("sneaker-1", "size", AttrValue::Integer(42));
        let blue = fixture.option("color", "Blue");
        let form = form(&fixture);
        assert_eq!(
            form.field("attr_color").unwrap().initial,
            Some(AttrValue::Choice(blue.id))
        );
        assert_eq!(form.field("attr_size").unwrap().initial, Some(AttrValue::Integer(42)));
        assert_eq!(form.field("attr_weight").unwrap().initial, None);
    }

    #[test]
    fn new_value_overrides_selector() {
        let fixture = fixture();
        let blue = fixture.option("color", "Blue");
        let mut form = form(&fixture);

        let data: FormData = [
            ("attr_color", blue.id.to_string()),
            ("option_attr_color", "Red".to_string()),
            ("attr_size", "42".to_string()),
        ]
        .into_iter()
        .collect();
        let report = form.submit(&data).unwrap();
        assert_eq!(report.written, 2);

        let red = fixture.option("color", "Red");
        assert_eq!(
            form.accessor().get("color").unwrap(),
            Some(AttrValue::Choice(red.id))
        );
        // Rebuilt after save: the new option is offered
        assert_eq!(form.field("attr_color").unwrap().choices.len(), 2);
    }

    #[test]
    fn collects_every_error() {
        let fixture = fixture();
        let mut form = form(&fixture);
        let data: FormData = [
            ("attr_color", ""),
            ("attr_size", "forty"),
            ("attr_weight", "heavy"),
        ]
        .into_iter()
        .collect();

        let errors = errors_of(form.validate(&data).unwrap_err());
        assert_eq!(errors.len(), 3);
        assert!(errors.has_field("attr_color"));
        assert!(matches!(
            errors.for_field("attr_size").next().map(|e| &e.kind),
            Some(FieldErrorKind::Coercion { .. })
        ));
        assert!(errors.has_field("attr_weight"));
        assert_eq!(form.accessor().staged_len(), 0);
    }

    #[test]
    fn no_option_created_when_other_fields_fail() {
        let fixture = fixture();
        let color = fixture.attribute("color");
        let mut form = form(&fixture);
        let data: FormData = [("option_attr_color", "Green"), ("attr_size", "forty")]
            .into_iter()
            .collect();

        let errors = errors_of(form.validate(&data).unwrap_err());
        assert!(!errors.has_field("attr_color"));
        assert_eq!(fixture.store.list_options(color.id).unwrap().len(), 1);
    }

    #[test]
    fn invalid_choice_rejected() {
        let fixture = fixture()
            .with_attribute(AttributeDraft::new("Lining", AttributeKind::Select).category("shoes"))
            .with_option("lining", "Silk");
        let silk = fixture.option("lining", "Silk");
        let mut form = form(&fixture);

        let data: FormData = [
            ("attr_color", silk.id.to_string()),
            ("attr_size", "40".to_string()),
        ]
        .into_iter()
        .collect();
        let errors = errors_of(form.validate(&data).unwrap_err());
        assert!(matches!(
            errors.for_field("attr_color").next().map(|e| &e.kind),
            Some(FieldErrorKind::InvalidChoice { .. })
        ));
    }

    #[test]
    fn absent_required_key_uses_current_value() {
        let fixture = fixture()
            .with_choice("sneaker-1", "color", "Blue")
            .with_value("sneaker-1", "size", AttrValue::Integer(42));
        let mut form = form(&fixture);

        let data: FormData = [("attr_weight", "0.9")].into_iter().collect();
        let report = form.submit(&data).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(
            fixture
                .store
                .item_values(&ItemId::new("sneaker-1"))
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn only_submitted_keys_are_staged() {
        let fixture = fixture()
            .with_choice("sneaker-1", "color", "Blue")
            .with_value("sneaker-1", "size", AttrValue::Integer(42))
            .with_value("sneaker-1", "weight", AttrValue::Decimal(1.0));
        let mut form = form(&fixture);

        let data: FormData = [("attr_size", "43")].into_iter().collect();
        form.validate(&data).unwrap();
        assert_eq!(form.accessor().staged_len(), 1);
        form.save().unwrap();
        assert_eq!(
            form.accessor().get("weight").unwrap(),
            Some(AttrValue::Decimal(1.0))
        );
    }

    #[test]
    fn category_change_rebuilds_fields_and_purges() {
        let fixture = fixture()
            .with_choice("sneaker-1", "color", "Blue")
            .with_value("sneaker-1", "size", AttrValue::Integer(42));
        let mut form = form(&fixture);

        form.change_categories(category_set(["glasses"])).unwrap();
        let keys: Vec<&str> = form.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["attr_lens"]);

        let report = form.submit(&FormData::new()).unwrap();
        assert_eq!(report.purged, 2);
        assert!(fixture
            .store
            .item_values(&ItemId::new("sneaker-1"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn messages_use_localizer() {
        let fixture = fixture();
        let mut form = form(&fixture);
        let data: FormData = [("attr_color", ""), ("attr_size", "1")].into_iter().collect();
        let errors = errors_of(form.validate(&data).unwrap_err());
        assert_eq!(
            form.options().messages(&errors),
            vec![("attr_color".to_string(), "Color is required".to_string())]
        );
    }
}
