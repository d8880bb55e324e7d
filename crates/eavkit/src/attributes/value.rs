//! Attribute value types and input coercion.
//!
//! This module defines the runtime representation of a stored attribute value
//! and the rules that turn raw submitted text into one.

use super::AttributeKind;
use crate::model::OptionId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Runtime representation of an attribute value.
///
/// One variant per scalar column of the value table. The variant must agree with
/// the owning definition's [`AttributeKind`]; the store rejects rows that do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    /// Reference to an [`crate::model::AttributeOption`] of the same attribute.
    Choice(OptionId),
}

impl AttrValue {
    /// Whether this value can be stored under an attribute of `kind`.
    pub fn fits(&self, kind: AttributeKind) -> bool {
        matches!(
            (self, kind),
            (AttrValue::Text(_), AttributeKind::Text)
                | (AttrValue::Integer(_), AttributeKind::Integer)
                | (AttrValue::Decimal(_), AttributeKind::Decimal)
                | (AttrValue::Bool(_), AttributeKind::Boolean)
                | (AttrValue::Choice(_), AttributeKind::Select)
        )
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Text(_) => "text",
            AttrValue::Integer(_) => "integer",
            AttrValue::Decimal(_) => "decimal",
            AttrValue::Bool(_) => "boolean",
            AttrValue::Choice(_) => "choice",
        }
    }

    /// Text form that [`coerce`] turns back into the same value.
    pub fn to_input(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Integer(n) => n.to_string(),
            AttrValue::Decimal(n) => n.to_string(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Choice(id) => id.to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            AttrValue::Decimal(n) => Some(*n),
            AttrValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<OptionId> {
        match self {
            AttrValue::Choice(id) => Some(*id),
            _ => None,
        }
    }
}

/// Raw input that does not match an attribute's declared kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("'{0}' is not a whole number")]
    InvalidInteger(String),

    #[error("'{0}' is not a number")]
    InvalidDecimal(String),

    #[error("'{0}' is not a yes/no value")]
    InvalidBoolean(String),

    #[error("'{0}' is not an option id")]
    InvalidOptionId(String),

    #[error("expected a {expected} value, got {found}")]
    KindMismatch {
        expected: AttributeKind,
        found: &'static str,
    },
}

const TRUE_WORDS: &[&str] = &["true", "1", "yes", "on"];
const FALSE_WORDS: &[&str] = &["false", "0", "no", "off"];

/// Coerce raw submitted text into a value of `kind`.
///
/// Blank input (empty or whitespace only) is "no value" and yields `Ok(None)`
/// for every kind. Text keeps its input verbatim apart from surrounding
/// whitespace; numbers, booleans and option ids must parse.
pub fn coerce(kind: AttributeKind, raw: &str) -> Result<Option<AttrValue>, CoercionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value = match kind {
        AttributeKind::Text => AttrValue::Text(trimmed.to_string()),
        AttributeKind::Integer => trimmed
            .parse::<i64>()
            .map(AttrValue::Integer)
            .map_err(|_| CoercionError::InvalidInteger(trimmed.to_string()))?,
        AttributeKind::Decimal => match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => AttrValue::Decimal(n),
            _ => return Err(CoercionError::InvalidDecimal(trimmed.to_string())),
        },
        AttributeKind::Boolean => {
            let lowered = trimmed.to_ascii_lowercase();
            if TRUE_WORDS.contains(&lowered.as_str()) {
                AttrValue::Bool(true)
            } else if FALSE_WORDS.contains(&lowered.as_str()) {
                AttrValue::Bool(false)
            } else {
                return Err(CoercionError::InvalidBoolean(trimmed.to_string()));
            }
        }
        AttributeKind::Select => Uuid::parse_str(trimmed)
            .map(AttrValue::Choice)
            .map_err(|_| CoercionError::InvalidOptionId(trimmed.to_string()))?,
    };

    Ok(Some(value))
}

/// Check an already-typed value against `kind`.
pub fn check_kind(kind: AttributeKind, value: &AttrValue) -> Result<(), CoercionError> {
    if value.fits(kind) {
        Ok(())
    } else {
        Err(CoercionError::KindMismatch {
            expected: kind,
            found: value.type_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AttributeKind::Text)]
    #[case(AttributeKind::Integer)]
    #[case(AttributeKind::Decimal)]
    #[case(AttributeKind::Boolean)]
    #[case(AttributeKind::Select)]
    fn blank_input_is_no_value(#[case] kind: AttributeKind) {
        assert_eq!(coerce(kind, ""), Ok(None));
        assert_eq!(coerce(kind, "   "), Ok(None));
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(
            coerce(AttributeKind::Text, "  Leather "),
            Ok(Some(AttrValue::Text("Leather".into())))
        );
    }

    #[test]
    fn integer_parses_or_fails() {
        assert_eq!(
            coerce(AttributeKind::Integer, "42"),
            Ok(Some(AttrValue::Integer(42)))
        );
        assert_eq!(
            coerce(AttributeKind::Integer, "abc"),
            Err(CoercionError::InvalidInteger("abc".into()))
        );
        assert_eq!(
            coerce(AttributeKind::Integer, "4.5"),
            Err(CoercionError::InvalidInteger("4.5".into()))
        );
    }

    #[test]
    fn decimal_rejects_non_finite() {
        assert_eq!(
            coerce(AttributeKind::Decimal, "4.5"),
            Ok(Some(AttrValue::Decimal(4.5)))
        );
        assert_eq!(
            coerce(AttributeKind::Decimal, "NaN"),
            Err(CoercionError::InvalidDecimal("NaN".into()))
        );
        assert_eq!(
            coerce(AttributeKind::Decimal, "abc"),
            Err(CoercionError::InvalidDecimal("abc".into()))
        );
    }

    #[rstest]
    #[case("true", true)]
    #[case("Yes", true)]
    #[case("on", true)]
    #[case("1", true)]
    #[case("false", false)]
    #[case("NO", false)]
    #[case("0", false)]
    fn boolean_words(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(
            coerce(AttributeKind::Boolean, raw),
            Ok(Some(AttrValue::Bool(expected)))
        );
    }

    #[test]
    fn boolean_rejects_other_words() {
        assert_eq!(
            coerce(AttributeKind::Boolean, "maybe"),
            Err(CoercionError::InvalidBoolean("maybe".into()))
        );
    }

    #[test]
    fn select_requires_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(
            coerce(AttributeKind::Select, &id.to_string()),
            Ok(Some(AttrValue::Choice(id)))
        );
        assert!(matches!(
            coerce(AttributeKind::Select, "red"),
            Err(CoercionError::InvalidOptionId(_))
        ));
    }

    #[test]
    fn to_input_coerces_back() {
        let values = [
            (AttributeKind::Text, AttrValue::Text("Canvas".into())),
            (AttributeKind::Integer, AttrValue::Integer(-3)),
            (AttributeKind::Decimal, AttrValue::Decimal(0.25)),
            (AttributeKind::Boolean, AttrValue::Bool(false)),
            (AttributeKind::Select, AttrValue::Choice(Uuid::new_v4())),
        ];
        for (kind, value) in values {
            assert_eq!(coerce(kind, &value.to_input()), Ok(Some(value)));
        }
    }

    #[test]
    fn check_kind_reports_mismatch() {
        assert!(check_kind(AttributeKind::Integer, &AttrValue::Integer(1)).is_ok());
        assert_eq!(
            check_kind(AttributeKind::Integer, &AttrValue::Text("1".into())),
            Err(CoercionError::KindMismatch {
                expected: AttributeKind::Integer,
                found: "text",
            })
        );
    }

    #[test]
    fn accessors_extract_variants() {
        assert_eq!(AttrValue::Text("a".into()).as_text(), Some("a"));
        assert_eq!(AttrValue::Integer(2).as_integer(), Some(2));
        assert_eq!(AttrValue::Integer(2).as_decimal(), Some(2.0));
        assert_eq!(AttrValue::Bool(true).as_bool(), Some(true));
        assert_eq!(AttrValue::Bool(true).as_text(), None);
        let id = Uuid::new_v4();
        assert_eq!(AttrValue::Choice(id).as_choice(), Some(id));
    }

    #[test]
    fn serializes_as_tagged_column() {
        let json = serde_json::to_value(AttrValue::Integer(7)).unwrap();
        assert_eq!(json["type"], "integer");
        assert_eq!(json["value"], 7);
    }
}
