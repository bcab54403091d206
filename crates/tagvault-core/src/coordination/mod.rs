//! Read and write coordination across the profiles of a logical database.
//!
//! Reads race: the first accepted result wins and the rest are cancelled.
//! Writes fan out: every profile is attempted and every outcome is kept.

pub(crate) mod accumulator;
pub mod read;
pub mod registry;
pub mod write;

pub use read::ReadCoordinator;
pub use registry::{ProfileHandle, ProfileRegistry};
pub use write::WriteCoordinator;
