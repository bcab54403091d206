//! File persistence replicated across a channel's targets.

pub mod atomic;
mod file_replicator;
mod probe;

pub use file_replicator::FileReplicator;
pub use probe::FsTargetProbe;
