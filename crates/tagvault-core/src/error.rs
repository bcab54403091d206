//! Core error type for semantic domain errors.
//!
//! Coordinators report per-target failures through outcome values; this type
//! covers what is wrong with the request itself (unknown names, unusable
//! channels, bad artifacts, bad configuration). Adapters map it to their
//! own error types (CLI exit codes).

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::ArtifactError;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The logical database name has no registered profiles.
    #[error("Unknown logical database: {0}")]
    UnknownDatabase(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// The channel exists but has no configured targets.
    #[error("Channel {0} has no configured targets")]
    ChannelNotUsable(String),

    /// Every target of the channel is unreachable right now.
    #[error("No accessible target for channel {0}")]
    NoAccessibleTarget(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every profile or target failed.
    #[error("{operation} failed everywhere: {detail}")]
    TotalFailure {
        operation: &'static str,
        detail: String,
    },
}
