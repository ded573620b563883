//! borderpath CLI library.
//!
//! Subcommand handlers and output formatting for the `borderpath-cli`
//! binary.

pub mod commands;
pub mod output;
