//! Configuration types and validation.
//!
//! Loading the file is the caller's job (see the CLI bootstrap); this module
//! only describes the shape and checks it.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ConnectionProfile, LogicalDatabaseName, Target};

/// Default catalog freshness window.
pub const DEFAULT_CATALOG_TTL_SECS: u64 = 300;

/// Default bound on a single attempt against one profile or target.
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 5_000;

/// Default directory, relative to each target root, holding TAG files.
pub const DEFAULT_ARTIFACT_SUBDIR: &str = "COMMERCIALS";

const fn default_catalog_ttl_secs() -> u64 {
    DEFAULT_CATALOG_TTL_SECS
}

const fn default_attempt_timeout_ms() -> u64 {
    DEFAULT_ATTEMPT_TIMEOUT_MS
}

fn default_artifact_subdir() -> String {
    DEFAULT_ARTIFACT_SUBDIR.to_string()
}

/// Configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration could not be parsed: {0}")]
    Parse(String),

    #[error("Logical database {0} has no connection profiles")]
    EmptyProfileGroup(String),

    #[error("Logical database {group} lists profile {profile} more than once")]
    DuplicateProfile { group: String, profile: String },

    #[error("Channel {0} is configured more than once")]
    DuplicateChannel(String),

    #[error("Catalog database {0} is not defined")]
    UnknownCatalogDatabase(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Statically configured targets for one channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelTargets {
    pub name: String,
    /// Target roots in priority order; the first is the primary.
    pub targets: Vec<PathBuf>,
}

impl ChannelTargets {
    pub fn to_targets(&self) -> Vec<Target> {
        self.targets.iter().cloned().map(Target::new).collect()
    }
}

/// Full coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagVaultConfig {
    /// Logical database name to its ordered profile list.
    pub databases: BTreeMap<LogicalDatabaseName, Vec<ConnectionProfile>>,

    /// Logical database holding the channel listing and schedule rows.
    pub catalog_database: LogicalDatabaseName,

    #[serde(default)]
    pub channels: Vec<ChannelTargets>,

    /// Principals allowed past the startup gate (administrators always are).
    #[serde(default)]
    pub authorized_principals: Vec<String>,

    #[serde(default = "default_catalog_ttl_secs")]
    pub catalog_ttl_secs: u64,

    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    #[serde(default = "default_artifact_subdir")]
    pub artifact_subdir: String,
}

impl TagVaultConfig {
    /// Parse JSON text and validate the result.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate_config(&config)?;
        Ok(config)
    }

    pub const fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

/// Validate a configuration.
pub fn validate_config(config: &TagVaultConfig) -> Result<(), ConfigError> {
    for (group, profiles) in &config.databases {
        if profiles.is_empty() {
            return Err(ConfigError::EmptyProfileGroup(group.to_string()));
        }
        let mut seen = HashSet::new();
        for profile in profiles {
            if !seen.insert(profile.name.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateProfile {
                    group: group.to_string(),
                    profile: profile.name.clone(),
                });
            }
            if profile.max_connections == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "max_connections",
                    reason: format!("profile {} must allow at least one connection", profile.name),
                });
            }
        }
    }

    if !config.databases.contains_key(&config.catalog_database) {
        return Err(ConfigError::UnknownCatalogDatabase(
            config.catalog_database.to_string(),
        ));
    }

    let mut channels = HashSet::new();
    for channel in &config.channels {
        if channel.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "channels",
                reason: "channel name cannot be empty".to_string(),
            });
        }
        if !channels.insert(channel.name.to_ascii_lowercase()) {
            return Err(ConfigError::DuplicateChannel(channel.name.clone()));
        }
    }

    if config.catalog_ttl_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "catalog_ttl_secs",
            reason: "must be greater than zero".to_string(),
        });
    }
    if config.attempt_timeout_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field: "attempt_timeout_ms",
            reason: "must be greater than zero".to_string(),
        });
    }
    if config.artifact_subdir.contains("..") {
        return Err(ConfigError::InvalidValue {
            field: "artifact_subdir",
            reason: "must stay inside the target root".to_string(),
        });
    }

    Ok(())
}
