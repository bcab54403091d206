//! Domain types: topology, artifacts, rows and statement parameters.

pub mod artifact;
pub mod rows;
pub mod topology;

pub use artifact::{ArtifactError, CutEntry, PlaylistArtifact, TAG_EXTENSION, rewrite_legacy_drive};
pub use rows::{
    CommercialRowParams, DbRow, DbValue, NoParams, PathKeyParams, RenameRowParams, RowCursor,
    SlotKeyParams, StatementParams,
};
pub use topology::{Channel, ConnectionProfile, LogicalDatabaseName, Target};
