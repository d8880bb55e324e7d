//! # Attribute System
//!
//! Catalog items carry a fixed set of columns; everything else is an attribute.
//! An attribute is defined once, linked to the categories it applies to, and
//! stored per item as a single typed value row.
//!
//! - **Definitions** ([`spec`]): name, code, kind, flags and categories
//! - **Values** ([`value`]): the typed scalar stored per (item, attribute), and
//!   the coercion rules for raw form input
//! - **Filtering** ([`filter`]): narrowing item listings by selected options
//!
//! ## Attribute Kinds
//!
//! | Kind | Stored as | Input |
//! |------|-----------|-------|
//! | `Text` | `AttrValue::Text` | free text |
//! | `Integer` | `AttrValue::Integer` | whole number |
//! | `Decimal` | `AttrValue::Decimal` | number |
//! | `Boolean` | `AttrValue::Bool` | yes/no |
//! | `Select` | `AttrValue::Choice` | one option id, or a new option label |
//!
//! ## Usage
//!
//! ```ignore
//! let draft = AttributeDraft::new("Color", AttributeKind::Select)
//!     .required()
//!     .filterable()
//!     .category("shoes");
//! let color = store.save_attribute(draft)?;
//!
//! let red = store.get_or_create_option(color.id, "Red")?;
//! let selection = FilterSelection::new().select(color.id, [red.id]);
//! let matching = selection.apply(&store, &items)?;
//! ```

pub mod filter;
pub mod spec;
pub mod value;

pub use filter::{available_options, AvailableOptions, FilterSelection};
pub use spec::{AttributeDefinition, AttributeDraft, AttributeKind};
pub use value::{check_kind, coerce, AttrValue, CoercionError};
