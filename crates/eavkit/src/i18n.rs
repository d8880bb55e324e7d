//! User-facing text.
//!
//! Field labels and validation messages never hard-code text; they go through a
//! [`Localizer`], keyed by opaque message ids with named `{placeholders}`.
//! [`DefaultLocalizer`] ships the English catalog.

use crate::attributes::CoercionError;
use crate::error::FieldErrorKind;

const ENGLISH: &[(&str, &str)] = &[
    ("attributes.required", "{name} is required"),
    ("attributes.new_value", "{name} [New value]"),
    ("attributes.yes", "Yes"),
    ("attributes.no", "No"),
    ("attributes.invalid_integer", "'{value}' is not a whole number"),
    ("attributes.invalid_decimal", "'{value}' is not a number"),
    ("attributes.invalid_boolean", "'{value}' is not a yes/no value"),
    ("attributes.invalid_option_id", "'{value}' is not an option id"),
    ("attributes.kind_mismatch", "expected a {expected} value, got {found}"),
    (
        "attributes.invalid_choice",
        "Select a valid choice. '{value}' is not one of the available choices",
    ),
    ("attributes.duplicate_code", "An attribute with code '{code}' already exists"),
    ("attributes.empty_name", "Name cannot be empty"),
    ("attributes.invalid_code", "Invalid code: {reason}"),
    (
        "attributes.immutable_code",
        "Code '{code}' is used by stored values and cannot change",
    ),
    (
        "attributes.immutable_kind",
        "Kind of '{code}' cannot change while values are stored",
    ),
];

/// Maps message keys and named arguments to display text.
pub trait Localizer: Send + Sync {
    /// Text for `key`, with each `{name}` placeholder replaced from `args`.
    fn text(&self, key: &str, args: &[(&str, &str)]) -> String;

    /// Label of the free-text "new option" field next to a selector.
    fn new_value_label(&self, attribute_name: &str) -> String {
        self.text("attributes.new_value", &[("name", attribute_name)])
    }

    fn yes_no(&self, value: bool) -> String {
        self.text(if value { "attributes.yes" } else { "attributes.no" }, &[])
    }

    fn field_error(&self, kind: &FieldErrorKind) -> String {
        match kind {
            FieldErrorKind::Required { attribute } => {
                self.text("attributes.required", &[("name", attribute.as_str())])
            }
            FieldErrorKind::Coercion { error } => self.coercion_error(error),
            FieldErrorKind::InvalidChoice { value } => {
                self.text("attributes.invalid_choice", &[("value", value.as_str())])
            }
            FieldErrorKind::DuplicateCode { code } => {
                self.text("attributes.duplicate_code", &[("code", code.as_str())])
            }
            FieldErrorKind::EmptyName => self.text("attributes.empty_name", &[]),
            FieldErrorKind::InvalidCode { error } => {
                let reason = error.to_string();
                self.text("attributes.invalid_code", &[("reason", reason.as_str())])
            }
            FieldErrorKind::ImmutableCode { code } => {
                self.text("attributes.immutable_code", &[("code", code.as_str())])
            }
            FieldErrorKind::ImmutableKind { code } => {
                self.text("attributes.immutable_kind", &[("code", code.as_str())])
            }
        }
    }

    fn coercion_error(&self, error: &CoercionError) -> String {
        match error {
            CoercionError::InvalidInteger(v) => {
                self.text("attributes.invalid_integer", &[("value", v.as_str())])
            }
            CoercionError::InvalidDecimal(v) => {
                self.text("attributes.invalid_decimal", &[("value", v.as_str())])
            }
            CoercionError::InvalidBoolean(v) => {
                self.text("attributes.invalid_boolean", &[("value", v.as_str())])
            }
            CoercionError::InvalidOptionId(v) => {
                self.text("attributes.invalid_option_id", &[("value", v.as_str())])
            }
            CoercionError::KindMismatch { expected, found } => self.text(
                "attributes.kind_mismatch",
                &[("expected", expected.as_str()), ("found", *found)],
            ),
        }
    }
}

/// English messages. Unknown keys render as the key itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLocalizer;

impl Localizer for DefaultLocalizer {
    fn text(&self, key: &str, args: &[(&str, &str)]) -> String {
        let template = ENGLISH
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, t)| *t)
            .unwrap_or(key);
        interpolate(template, args)
    }
}

fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeKind;
    use crate::codes::CodeValidationError;

    struct Shouting;

    impl Localizer for Shouting {
        fn text(&self, key: &str, args: &[(&str, &str)]) -> String {
            DefaultLocalizer.text(key, args).to_uppercase()
        }
    }

    #[test]
    fn fills_placeholders() {
        assert_eq!(
            DefaultLocalizer.text("attributes.required", &[("name", "Color")]),
            "Color is required"
        );
        assert_eq!(DefaultLocalizer.new_value_label("Color"), "Color [New value]");
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(DefaultLocalizer.text("attributes.nope", &[]), "attributes.nope");
    }

    #[test]
    fn every_error_kind_has_text() {
        let kinds = [
            FieldErrorKind::Required {
                attribute: "Color".into(),
            },
            FieldErrorKind::Coercion {
                error: CoercionError::KindMismatch {
                    expected: AttributeKind::Integer,
                    found: "text",
                },
            },
            FieldErrorKind::InvalidChoice { value: "x".into() },
            FieldErrorKind::DuplicateCode { code: "color".into() },
            FieldErrorKind::EmptyName,
            FieldErrorKind::InvalidCode {
                error: CodeValidationError::Empty,
            },
            FieldErrorKind::ImmutableCode { code: "color".into() },
            FieldErrorKind::ImmutableKind { code: "color".into() },
        ];
        for kind in &kinds {
            let text = DefaultLocalizer.field_error(kind);
            assert!(!text.starts_with("attributes."), "missing text for {kind:?}");
            assert!(!text.contains('{'), "unfilled placeholder in {text}");
        }
    }

    #[test]
    fn custom_localizer_reuses_provided_methods() {
        let text = Shouting.coercion_error(&CoercionError::InvalidInteger("abc".into()));
        assert_eq!(text, "'ABC' IS NOT A WHOLE NUMBER");
    }
}
