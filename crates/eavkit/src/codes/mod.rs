//! Attribute codes.
//!
//! Every attribute has a code: a lowercase, separator-joined identifier used as
//! the storage key and in form keys (`attr_<code>`). When an administrator
//! leaves the code blank it is derived from the attribute name by a
//! [`SlugNormalizer`].
//!
//! ## Code Rules
//!
//! See [`validation`] for the full rules. In summary:
//! - Lowercase ASCII letters, digits, `_` and `-`
//! - No leading, trailing or doubled separators

pub mod validation;

pub use validation::{validate_code, CodeValidationError};

/// Turns free text into a code.
pub trait SlugNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Transliterating normalizer built on the `slug` crate.
///
/// `slug` joins words with `-`; the separator is swapped for the configured
/// one (underscore by default, so "Heel height" becomes `heel_height`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSlugger {
    separator: char,
}

impl Default for DefaultSlugger {
    fn default() -> Self {
        Self { separator: '_' }
    }
}

impl DefaultSlugger {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl SlugNormalizer for DefaultSlugger {
    fn normalize(&self, text: &str) -> String {
        let slug = slug::slugify(text);
        if self.separator == '-' {
            slug
        } else {
            slug.replace('-', &self.separator.to_string())
        }
    }
}
