use crate::attributes::CoercionError;
use crate::codes::CodeValidationError;
use crate::i18n::{DefaultLocalizer, Localizer};
use crate::model::{AttributeId, OptionId};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EavError {
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("Option not found: {0}")]
    OptionNotFound(OptionId),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Integrity violation: {0}")]
    Integrity(IntegrityViolation),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, EavError>;

impl From<ValidationErrors> for EavError {
    fn from(errors: ValidationErrors) -> Self {
        EavError::Validation(errors)
    }
}

impl From<IntegrityViolation> for EavError {
    fn from(violation: IntegrityViolation) -> Self {
        EavError::Integrity(violation)
    }
}

/// A storage-level constraint violation.
///
/// Only [`IntegrityViolation::DuplicateOption`] is recoverable: option
/// get-or-create treats it as "someone else created it first". Everything
/// else aborts the surrounding transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    #[error("attribute code '{0}' already exists")]
    DuplicateCode(String),

    #[error("option '{name}' already exists for attribute {attribute}")]
    DuplicateOption { attribute: AttributeId, name: String },

    #[error("attribute {0} does not exist")]
    MissingAttribute(AttributeId),

    #[error("option {option} does not belong to attribute {attribute}")]
    ForeignOption {
        attribute: AttributeId,
        option: OptionId,
    },

    #[error("value kind does not match attribute {0}")]
    KindMismatch(AttributeId),
}

/// What went wrong with one submitted field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// No value resolved for a required attribute.
    Required { attribute: String },
    /// Raw input could not be coerced to the attribute's kind.
    Coercion {
        #[serde(skip)]
        error: CoercionError,
    },
    /// Selector value is not one of the attribute's options.
    InvalidChoice { value: String },
    DuplicateCode { code: String },
    EmptyName,
    InvalidCode {
        #[serde(skip)]
        error: CodeValidationError,
    },
    /// The code is referenced by stored values and cannot change.
    ImmutableCode { code: String },
    /// The kind is referenced by stored values and cannot change.
    ImmutableKind { code: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Form key of the offending field (e.g. `attr_color`, `code`).
    pub field: String,
    #[serde(flatten)]
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = DefaultLocalizer.field_error(&self.kind);
        write!(f, "{}: {}", self.field, text)
    }
}

/// Every user-correctable problem found in one submission.
///
/// Validation never stops at the first failing field, so callers get the
/// complete list in one round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn add(&mut self, field: impl Into<String>, kind: FieldErrorKind) {
        self.push(FieldError::new(field, kind));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Errors reported for a single form key.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> {
        self.errors.iter().filter(move |e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was collected, the error set otherwise.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}
