//! Replica endpoint port.
//!
//! One implementation instance talks to one physical database endpoint.
//! Coordinators hold several of them per logical database name.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::domain::{DbRow, DbValue};

/// Errors surfaced by a single endpoint.
///
/// Implementations must distinguish "could not reach the endpoint" from
/// "reached it but the statement failed"; callers report them differently.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Statement(String),
}

/// A single physical database endpoint.
///
/// # Design Rules
///
/// - No driver types in signatures
/// - Placeholders are positional (`?1`, `?2`, ...) and bound from `params`
/// - `fetch` materializes the full result; the coordinator owns cursoring
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReplicaEndpoint: Send + Sync {
    /// Run a query and return every row.
    async fn fetch(&self, sql: &str, params: &[DbValue]) -> Result<Vec<DbRow>, EndpointError>;

    /// Run a statement and return the number of rows it affected.
    async fn execute(&self, sql: &str, params: &[DbValue]) -> Result<u64, EndpointError>;
}
