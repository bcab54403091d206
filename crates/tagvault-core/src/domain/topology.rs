//! Target topology: database profile groups, file-share targets, channels.
//!
//! These are plain data types. Reachability is never stored here; it is
//! evaluated per call through the [`TargetProbe`](crate::ports::TargetProbe)
//! port.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Label grouping several physical database endpoints that hold copies of
/// the same logical data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalDatabaseName(String);

impl LogicalDatabaseName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalDatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalDatabaseName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

const fn default_max_connections() -> u32 {
    2
}

const fn default_connect_timeout_ms() -> u64 {
    3_000
}

/// One physical database endpoint.
///
/// Profiles are fixed at configuration time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Identifying name, reported as the source of reads and in failures.
    pub name: String,
    /// Driver connection URL (e.g. `sqlite:///mnt/db1/schedule.db`).
    pub url: String,
    /// Upper bound on pooled connections to this endpoint.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long to wait for a connection before treating the endpoint as down.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl ConnectionProfile {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            max_connections: default_max_connections(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// A filesystem root acting as one redundant storage location for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target {
    root: PathBuf,
}

impl Target {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path relative to this target's root.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

/// A broadcast channel and its ordered redundant targets.
///
/// Identity is the name, compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub targets: Vec<Target>,
    /// True when the channel has no database row and exists only because
    /// configuration lists it.
    pub is_from_config: bool,
}

impl Channel {
    pub fn new(name: impl Into<String>, targets: Vec<Target>) -> Self {
        Self {
            name: name.into(),
            targets,
            is_from_config: false,
        }
    }

    pub fn from_config(name: impl Into<String>, targets: Vec<Target>) -> Self {
        Self {
            is_from_config: true,
            ..Self::new(name, targets)
        }
    }

    /// A channel is usable once it has at least one configured target.
    pub fn is_usable(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn primary_target(&self) -> Option<&Target> {
        self.targets.first()
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.name_matches(&other.name)
    }
}

impl Eq for Channel {}
