//! Terminal styles for the eavkit CLI.
//!
//! Rendering code refers to semantic names (a label, a muted id, an error
//! field) and never to raw colors, so the palette can change in one place.
//! `console` drops the escape codes on its own when stdout is not a terminal.

use console::Style;
use once_cell::sync::Lazy;

pub static LABEL: Lazy<Style> = Lazy::new(|| Style::new().bold());
pub static MUTED: Lazy<Style> = Lazy::new(|| Style::new().dim());
pub static KIND: Lazy<Style> = Lazy::new(|| Style::new().cyan());
pub static FLAG: Lazy<Style> = Lazy::new(|| Style::new().yellow());
pub static SUCCESS: Lazy<Style> = Lazy::new(|| Style::new().green());
pub static ERROR_FIELD: Lazy<Style> = Lazy::new(|| Style::new().red().bold());
