//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the coordinators expect from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` types in any signature
//! - Endpoint errors distinguish unreachable from failed statements
//! - Reachability is asked per call, never cached

pub mod replica_endpoint;
pub mod target_probe;

#[cfg(test)]
pub use replica_endpoint::MockReplicaEndpoint;
pub use replica_endpoint::{EndpointError, ReplicaEndpoint};
pub use target_probe::TargetProbe;
