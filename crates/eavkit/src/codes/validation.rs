//! Attribute code validation.
//!
//! Valid codes:
//! - Lowercase ASCII letters, digits, underscores (`_`) and hyphens (`-`)
//! - Cannot start or end with a separator
//! - Cannot have two separators in a row

/// Validates an attribute code.
///
/// Codes end up in form keys (`attr_<code>`) and URLs, so they are held to the
/// same shape the slug normalizer produces.
///
/// # Examples
/// ```
/// use eavkit::codes::validation::validate_code;
///
/// assert!(validate_code("color").is_ok());
/// assert!(validate_code("shoe_size").is_ok());
/// assert!(validate_code("size-eu").is_ok());
/// assert!(validate_code("2024_edition").is_ok());
///
/// assert!(validate_code("").is_err());
/// assert!(validate_code("_color").is_err());
/// assert!(validate_code("color_").is_err());
/// assert!(validate_code("shoe__size").is_err());
/// assert!(validate_code("Color").is_err());
/// ```
pub fn validate_code(code: &str) -> Result<(), CodeValidationError> {
    let Some(first_char) = code.chars().next() else {
        return Err(CodeValidationError::Empty);
    };
    if is_separator(first_char) {
        return Err(CodeValidationError::InvalidStart(first_char));
    }

    let mut prev_was_separator = false;
    for ch in code.chars() {
        if !is_valid_code_char(ch) {
            return Err(CodeValidationError::InvalidCharacter(ch));
        }

        if is_separator(ch) {
            if prev_was_separator {
                return Err(CodeValidationError::ConsecutiveSeparators);
            }
            prev_was_separator = true;
        } else {
            prev_was_separator = false;
        }
    }

    if prev_was_separator {
        return Err(CodeValidationError::EndsWithSeparator);
    }

    Ok(())
}

fn is_separator(ch: char) -> bool {
    ch == '_' || ch == '-'
}

fn is_valid_code_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || is_separator(ch)
}

/// Error type for code validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeValidationError {
    Empty,
    InvalidStart(char),
    EndsWithSeparator,
    ConsecutiveSeparators,
    InvalidCharacter(char),
}

impl std::fmt::Display for CodeValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeValidationError::Empty => write!(f, "code cannot be empty"),
            CodeValidationError::InvalidStart(ch) => {
                write!(f, "code cannot start with '{}'", ch)
            }
            CodeValidationError::EndsWithSeparator => {
                write!(f, "code cannot end with a separator")
            }
            CodeValidationError::ConsecutiveSeparators => {
                write!(f, "code cannot contain consecutive separators")
            }
            CodeValidationError::InvalidCharacter(ch) => {
                write!(
                    f,
                    "code contains invalid character '{}' (only lowercase letters, digits, underscore and hyphen allowed)",
                    ch
                )
            }
        }
    }
}

impl std::error::Error for CodeValidationError {}
