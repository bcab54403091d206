//! Shared CLI presentation utilities.
//!
//! Format-only: outcome values come from the core already aggregated.

pub mod outcomes;
pub mod tables;

pub use outcomes::{ensure_some_success, print_persist_report, print_repair_outcome};
pub use tables::{print_separator, truncate_string};
