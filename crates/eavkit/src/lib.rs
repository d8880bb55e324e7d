//! # Eavkit Architecture
//!
//! Eavkit is the **attribute layer of a product catalog**: operators attach typed
//! attributes (text, numbers, yes/no, single-select) to categories, and every
//! item in those categories gains them as editable, filterable fields, without
//! any change to the catalog's own schema.
//!
//! Items and categories belong to the host. Eavkit stores only attribute
//! definitions, their options and one value row per (item, attribute).
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host (eavkit-cli, or a web app)                            │
//! │  - Owns items and categories, renders fields, prints output │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Wires store, purge policy and form options               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Forms (forms/) and Accessor (accessor.rs)                  │
//! │  - Field synthesis, two-phase validation, staged writes     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - AttrStore trait, constraints, one transaction per write  │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! Nothing in this crate writes to stdout/stderr or exits the process. Errors
//! come back as [`error::EavError`]; user-correctable ones carry every failing
//! field at once ([`error::ValidationErrors`]).
//!
//! ## Module Overview
//!
//! - [`api`]: The facade hosts talk to
//! - [`attributes`]: Definitions, typed values and coercion, filtering
//! - [`accessor`]: Per-item get/set with a staged-write buffer
//! - [`applicable`]: Memoized applicable-attribute lookup
//! - [`forms`]: Edit and filter field descriptors
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Identifiers and row types
//! - [`catalog`]: Category provider seam
//! - [`codes`]: Code validation and derivation from names
//! - [`i18n`]: User-facing text
//! - [`config`]: Configuration
//! - [`error`]: Error types

pub mod accessor;
pub mod api;
pub mod applicable;
pub mod attributes;
pub mod catalog;
pub mod codes;
pub mod config;
pub mod error;
pub mod forms;
pub mod i18n;
pub mod model;
pub mod store;

#[cfg(test)]
pub mod test_utils;
