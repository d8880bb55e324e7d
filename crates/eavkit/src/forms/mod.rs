//! # Dynamic Form Fields
//!
//! The attribute set of an item is only known at runtime, so its form fields are
//! synthesized: one [`FieldDescriptor`] per applicable attribute, which the
//! hosting form layer renders and posts back as [`FormData`].
//!
//! - [`edit::EditForm`]: typed inputs for one item, two-phase validation, commit
//! - [`filter::FilterForm`]: multi-choice filters over a listing
//!
//! ## Field Keys
//!
//! | Field | Key |
//! |-------|-----|
//! | attribute value | `attr_<code>` |
//! | "new value" entry of a Select attribute | `option_attr_<code>` |

pub mod edit;
pub mod filter;

use crate::attributes::{AttrValue, AttributeKind};
use crate::model::AttributeOption;
use serde::Serialize;
use std::collections::HashMap;

pub use edit::{EditForm, FormOptions};
pub use filter::FilterForm;

pub const FIELD_PREFIX: &str = "attr_";
pub const NEW_OPTION_PREFIX: &str = "option_";

/// Form key of an attribute's value field.
pub fn field_key(code: &str) -> String {
    format!("{}{}", FIELD_PREFIX, code)
}

/// Form key of a Select attribute's free-text "new value" field.
pub fn new_option_key(code: &str) -> String {
    format!("{}{}", NEW_OPTION_PREFIX, field_key(code))
}

/// Input widget the form layer should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    TextInput,
    NumberInput,
    DecimalInput,
    Checkbox,
    Select,
    CheckboxSelectMultiple,
}

impl Widget {
    pub fn for_kind(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::Text => Widget::TextInput,
            AttributeKind::Integer => Widget::NumberInput,
            AttributeKind::Decimal => Widget::DecimalInput,
            AttributeKind::Boolean => Widget::Checkbox,
            AttributeKind::Select => Widget::Select,
        }
    }
}

/// One selectable entry: the submitted value and its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl From<&AttributeOption> for Choice {
    fn from(option: &AttributeOption) -> Self {
        Self {
            value: option.id.to_string(),
            label: option.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    /// Enforced by the form layer before submission reaches validation
    pub required: bool,
    pub widget: Widget,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<AttrValue>,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, widget: Widget) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            required: false,
            widget,
            choices: Vec::new(),
            initial: None,
        }
    }

    pub fn has_choice(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c.value == value)
    }
}

/// Submitted form data: every key may carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value submitted for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Replace whatever was submitted for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), vec![value.into()]);
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(key.into()).or_default().push(value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = FormData::new();
        for (key, value) in iter {
            data.append(key, value);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn keys_follow_code() {
        assert_eq!(field_key("color"), "attr_color");
        assert_eq!(new_option_key("color"), "option_attr_color");
    }

    #[rstest]
    #[case(AttributeKind::Text, Widget::TextInput)]
    #[case(AttributeKind::Integer, Widget::NumberInput)]
    #[case(AttributeKind::Decimal, Widget::DecimalInput)]
    #[case(AttributeKind::Boolean, Widget::Checkbox)]
    #[case(AttributeKind::Select, Widget::Select)]
    fn widget_per_kind(#[case] kind: AttributeKind, #[case] widget: Widget) {
        assert_eq!(Widget::for_kind(kind), widget);
    }

    #[test]
    fn form_data_keeps_multiple_values() {
        let data: FormData = [("attr_material", "a"), ("attr_material", "b"), ("attr_color", "")]
            .into_iter()
            .collect();
        assert_eq!(data.get("attr_material"), Some("a"));
        assert_eq!(data.get_all("attr_material").len(), 2);
        assert_eq!(data.get("attr_color"), Some(""));
        assert!(data.contains("attr_color"));
        assert!(!data.contains("attr_size"));
        assert!(data.get_all("attr_size").is_empty());
    }

    #[test]
    fn insert_replaces() {
        let mut data = FormData::new();
        data.append("k", "1");
        data.append("k", "2");
        data.insert("k", "3");
        assert_eq!(data.get_all("k"), ["3".to_string()]);
    }

    #[test]
    fn descriptor_serializes_without_empty_parts() {
        let field = FieldDescriptor::new("attr_note", "Note", Widget::TextInput);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["widget"], "text_input");
        assert!(json.get("choices").is_none());
        assert!(json.get("initial").is_none());
    }
}
