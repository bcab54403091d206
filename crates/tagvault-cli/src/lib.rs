//! Command-line adapter for tagvault.
//!
//! `main.rs` parses arguments, runs the access gate, and dispatches to
//! `handlers`, which act on the `CliContext` built in `bootstrap`.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

// Used only by the binary entry point
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap, bootstrap_with};
pub use commands::Commands;
pub use error::{CliError, exit_code_for};
pub use identity::{AccessPolicy, OsAccount, Principal};
pub use parser::Cli;
