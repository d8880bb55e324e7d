//! Attribute definitions.
//!
//! This module defines the schema side of the attribute layer: what kind of value
//! an attribute holds, its flags, and which categories it applies to.

use crate::model::{AttributeId, CategoryId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// The kind of value an attribute holds.
///
/// Determines the input widget, the coercion rules and which
/// [`super::AttrValue`] variant the value table stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Free text
    Text,

    /// Whole number
    Integer,

    /// Decimal number
    Decimal,

    /// Yes/no flag
    Boolean,

    /// One choice out of the attribute's option list
    Select,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 5] = [
        AttributeKind::Text,
        AttributeKind::Integer,
        AttributeKind::Decimal,
        AttributeKind::Boolean,
        AttributeKind::Select,
    ];

    /// Only Select attributes own options.
    pub fn has_options(self) -> bool {
        self == AttributeKind::Select
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Text => "text",
            AttributeKind::Integer => "integer",
            AttributeKind::Decimal => "decimal",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Select => "select",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: AttributeId,

    /// Display label
    pub name: String,

    /// Storage and URL safe identifier, unique across all definitions
    pub code: String,

    pub kind: AttributeKind,

    /// A submission must resolve a value for this attribute
    pub is_required: bool,

    /// Shown to end users alongside the item
    pub is_visible: bool,

    /// Offered in listing filters
    pub is_filterable: bool,

    /// Categories this attribute applies to
    #[serde(default)]
    pub categories: BTreeSet<CategoryId>,
}

impl AttributeDefinition {
    pub fn has_options(&self) -> bool {
        self.kind.has_options()
    }

    /// Form key of the attribute's main field.
    pub fn field_key(&self) -> String {
        crate::forms::field_key(&self.code)
    }

    /// Form key of the free-text "new value" field of a Select attribute.
    pub fn new_option_key(&self) -> String {
        crate::forms::new_option_key(&self.code)
    }

    pub fn applies_to(&self, categories: &BTreeSet<CategoryId>) -> bool {
        !self.categories.is_disjoint(categories)
    }
}

/// Input for creating or updating a definition.
///
/// A blank `code` is derived from `name` by the store's slug normalizer.
/// `id` is `None` for a new definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDraft {
    pub id: Option<AttributeId>,
    pub name: String,
    pub code: String,
    pub kind: AttributeKind,
    pub is_required: bool,
    pub is_visible: bool,
    pub is_filterable: bool,
    pub categories: BTreeSet<CategoryId>,
}

impl AttributeDraft {
    /// A new, optional, visible, non-filterable attribute with a derived code.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            code: String::new(),
            kind,
            is_required: false,
            is_visible: true,
            is_filterable: false,
            categories: BTreeSet::new(),
        }
    }

    /// Start an edit of an existing definition.
    pub fn edit(def: &AttributeDefinition) -> Self {
        Self {
            id: Some(def.id),
            name: def.name.clone(),
            code: def.code.clone(),
            kind: def.kind,
            is_required: def.is_required,
            is_visible: def.is_visible,
            is_filterable: def.is_filterable,
            categories: def.categories.clone(),
        }
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.is_filterable = true;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(CategoryId::new(category));
        self
    }

    pub fn categories(mut self, categories: BTreeSet<CategoryId>) -> Self {
        self.categories = categories;
        self
    }

    /// Materialize the draft once the code is settled.
    pub(crate) fn into_definition(self, code: String) -> AttributeDefinition {
        AttributeDefinition {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name.trim().to_string(),
            code,
            kind: self.kind,
            is_required: self.is_required,
            is_visible: self.is_visible,
            is_filterable: self.is_filterable,
            categories: self.categories,
        }
    }
}
