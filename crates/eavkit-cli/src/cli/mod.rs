//! # CLI Behavior
//!
//! This is **one possible host** for eavkit, not the library itself.
//! The CLI is the only place that knows about terminal I/O, exit codes and
//! output formatting.
//!
//! ## Items Come From The Command Line
//!
//! Items and categories belong to the host. The CLI keeps no catalog, so item
//! commands name the item and its categories explicitly:
//!
//! ```text
//! eavkit edit --item sneaker-1 --category shoes attr_color= option_attr_color=Red
//! eavkit show --item sneaker-1 --category shoes
//! ```
//!
//! Moving an item is `edit --new-category ...`; the configured purge policy
//! decides which stored values survive.
//!
//! ## Form Fields As Arguments
//!
//! Edit and filter submissions are `KEY=VALUE` pairs using the same keys the
//! form layer synthesizes (`attr_<code>`, `option_attr_<code>`). A key may be
//! repeated; `KEY=` submits an empty value.
//!
//! ## Module Structure
//!
//! - `commands`: context setup, dispatch and per-command handlers
//! - `render`: text output (tables, values, field errors)
//! - `setup`: argument parsing via clap
//! - `styles`: terminal styling constants

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
