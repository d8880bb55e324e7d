//! # Eavkit CLI
//!
//! A terminal host for the eavkit attribute layer. The binary is thin: all
//! attribute semantics live in the `eavkit` library, the CLI lives in
//! `src/cli/`, and this file only invokes `cli::run()` and handles process
//! termination.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/eavkit-cli/src/cli/)                     │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Context wiring + dispatch (commands.rs)                  │
//! │  - Terminal rendering with console styles (render.rs)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/eavkit/src/api.rs)                       │
//! │  - Returns structured values, never terminal text           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The CLI plays the host's role: it has no item table of its own, so every
//! item command takes the item id and its categories as arguments.
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. The filter comes from
//! `EAVKIT_LOG` (standard `EnvFilter` syntax), defaulting to `warn`, or
//! `debug` with `--verbose`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
