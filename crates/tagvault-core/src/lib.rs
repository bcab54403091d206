//! Redundant target coordination for broadcast commercial scheduling.
//!
//! Turns a set of unreliable database replicas and file-share mounts into
//! operations with explicit partial-failure outcomes:
//!
//! - [`ReadCoordinator`]: race a query, first accepted result wins
//! - [`WriteCoordinator`]: fan-out and self-healing (update, else insert) writes
//! - [`FileReplicator`]: atomic replicated write, rename, delete and repair
//! - [`ChannelCatalog`]: TTL-cached channel topology
//!
//! Infrastructure plugs in through the traits in [`ports`]; the `tagvault-db`
//! crate supplies the SQLite endpoint.

#![deny(unused_crate_dependencies)]

pub mod catalog;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod error;
pub mod outcome;
pub mod ports;
pub mod replication;
pub mod services;

pub use catalog::{CatalogState, ChannelCatalog};
pub use config::{
    ChannelTargets, ConfigError, DEFAULT_ARTIFACT_SUBDIR, DEFAULT_ATTEMPT_TIMEOUT_MS,
    DEFAULT_CATALOG_TTL_SECS, TagVaultConfig, validate_config,
};
pub use coordination::{ProfileHandle, ProfileRegistry, ReadCoordinator, WriteCoordinator};
pub use domain::{
    ArtifactError, Channel, CommercialRowParams, ConnectionProfile, CutEntry, DbRow, DbValue,
    LogicalDatabaseName, NoParams, PathKeyParams, PlaylistArtifact, RenameRowParams, RowCursor,
    SlotKeyParams, StatementParams, TAG_EXTENSION, Target,
};
pub use error::CoreError;
pub use outcome::{
    AttemptError, FailedPath, FileOpOutcome, OutcomeStatus, ProfileFailure, ReadOutcome,
    RepairOutcome, WriteOutcome,
};
pub use ports::{EndpointError, ReplicaEndpoint, TargetProbe};
pub use replication::{FileReplicator, FsTargetProbe};
pub use services::{
    ArtifactListing, CommercialScheduleService, CoordinatorContext, PersistReport,
    ScheduleStatements,
};
