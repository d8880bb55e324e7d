//! # Rendering Module
//!
//! Text output for the terminal. Every function takes library values and
//! returns a `String`; handlers decide where it goes. JSON output bypasses this
//! module and serializes the same values directly.

use super::styles::{ERROR_FIELD, FLAG, KIND, LABEL, MUTED, SUCCESS};
use eavkit::api::DisplayValue;
use eavkit::attributes::{AttrValue, AttributeDefinition};
use eavkit::forms::FieldDescriptor;
use eavkit::model::{AttributeOption, ItemId};
use eavkit::store::{CascadeReport, CommitReport};
use std::fmt::Write;

/// Width of the code column in attribute listings.
pub const COL_CODE: usize = 20;

pub fn render_attribute(def: &AttributeDefinition) -> String {
    let mut flags = Vec::new();
    if def.is_required {
        flags.push("required");
    }
    if !def.is_visible {
        flags.push("hidden");
    }
    if def.is_filterable {
        flags.push("filterable");
    }
    let categories: Vec<&str> = def.categories.iter().map(|c| c.as_str()).collect();

    let mut line = format!(
        "{:<width$} {} {}",
        def.code,
        LABEL.apply_to(&def.name),
        KIND.apply_to(format!("[{}]", def.kind)),
        width = COL_CODE
    );
    if !flags.is_empty() {
        let _ = write!(line, " {}", FLAG.apply_to(flags.join(",")));
    }
    if !categories.is_empty() {
        let _ = write!(line, " {}", MUTED.apply_to(format!("({})", categories.join(", "))));
    }
    line
}

pub fn render_attributes(defs: &[AttributeDefinition]) -> String {
    if defs.is_empty() {
        return format!("{}\n", MUTED.apply_to("No attributes."));
    }
    defs.iter().map(|d| render_attribute(d) + "\n").collect()
}

pub fn render_options(options: &[AttributeOption]) -> String {
    if options.is_empty() {
        return format!("{}\n", MUTED.apply_to("No options."));
    }
    options
        .iter()
        .map(|o| format!("{}  {}\n", MUTED.apply_to(o.id), o.name))
        .collect()
}

pub fn render_fields(fields: &[FieldDescriptor]) -> String {
    if fields.is_empty() {
        return format!("{}\n", MUTED.apply_to("No applicable attributes."));
    }
    let mut out = String::new();
    for field in fields {
        let _ = write!(
            out,
            "{} {} {}",
            field.key,
            LABEL.apply_to(&field.label),
            KIND.apply_to(format!("[{:?}]", field.widget))
        );
        if let Some(initial) = &field.initial {
            let _ = write!(out, " = {}", initial_text(field, initial));
        }
        out.push('\n');
        for choice in &field.choices {
            let _ = writeln!(out, "    {}  {}", MUTED.apply_to(&choice.value), choice.label);
        }
    }
    out
}

fn initial_text(field: &FieldDescriptor, value: &AttrValue) -> String {
    let raw = value.to_input();
    field
        .choices
        .iter()
        .find(|c| c.value == raw)
        .map(|c| c.label.clone())
        .unwrap_or(raw)
}

pub fn render_values(values: &[DisplayValue]) -> String {
    if values.is_empty() {
        return format!("{}\n", MUTED.apply_to("No values."));
    }
    values
        .iter()
        .map(|v| format!("{}: {}\n", LABEL.apply_to(&v.label), v.text))
        .collect()
}

pub fn render_commit(report: &CommitReport) -> String {
    let mut out = format!(
        "{} {} written, {} deleted",
        SUCCESS.apply_to("Saved:"),
        report.written,
        report.deleted
    );
    if report.purged > 0 {
        let _ = write!(out, ", {} purged", report.purged);
    }
    if report.unchanged > 0 {
        let _ = write!(out, ", {} unchanged", report.unchanged);
    }
    out.push('\n');
    out
}

pub fn render_cascade(what: &str, report: &CascadeReport) -> String {
    format!(
        "{} {} ({} options, {} values)\n",
        SUCCESS.apply_to("Deleted"),
        what,
        report.options,
        report.values
    )
}

pub fn render_items(items: &[ItemId]) -> String {
    if items.is_empty() {
        return format!("{}\n", MUTED.apply_to("No matching items."));
    }
    items.iter().map(|i| format!("{}\n", i)).collect()
}

/// `(field, message)` pairs, one per line.
pub fn render_field_errors(messages: &[(String, String)]) -> String {
    messages
        .iter()
        .map(|(field, message)| format!("{}: {}\n", ERROR_FIELD.apply_to(field), message))
        .collect()
}
