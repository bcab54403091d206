//! `SQLite` adapter for tagvault.
//!
//! Supplies the replica endpoint behind the core's `ReplicaEndpoint` port,
//! the schedule statement set, schema setup, and the factory that wires a
//! `CoordinatorContext` from configuration.

#![deny(unsafe_code)]

pub mod endpoint;
pub mod factory;
pub mod setup;
pub mod statements;

pub use endpoint::SqliteReplicaEndpoint;
pub use factory::ReplicaFactory;

// Re-export TestReplicaSet for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub use factory::TestReplicaSet;

pub use setup::{create_schema, initialize_replica};
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_replica;
pub use statements::schedule_statements;
