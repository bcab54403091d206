//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Configuration file loading and validation
//! - SQLite replica endpoints (via tagvault-db)
//! - Filesystem target probe and coordinators (via tagvault-core)
//!
//! Command handlers receive the composed `CliContext` and delegate to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tagvault_core::{
    ChannelCatalog, CommercialScheduleService, CoordinatorContext, FsTargetProbe, TagVaultConfig,
    TargetProbe,
};
use tagvault_db::ReplicaFactory;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path to the JSON configuration file.
    pub config_path: PathBuf,
}

impl CliConfig {
    /// Use the `--config` argument (which clap already falls back to
    /// `TAGVAULT_CONFIG` for).
    pub fn from_arg(config: Option<PathBuf>) -> Result<Self, CliError> {
        config
            .map(|config_path| Self { config_path })
            .ok_or_else(|| {
                CliError::Config(
                    "no configuration file; pass --config or set TAGVAULT_CONFIG".to_string(),
                )
            })
    }

    /// Read and validate the configuration file.
    pub fn load(&self) -> Result<TagVaultConfig, CliError> {
        load_config(&self.config_path)
    }
}

/// Read and validate a JSON configuration file.
pub fn load_config(path: &Path) -> Result<TagVaultConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    let config = TagVaultConfig::from_json_str(&text)?;
    info!(
        path = %path.display(),
        databases = config.databases.len(),
        channels = config.channels.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// Every coordinator, built once.
    pub coordinator: CoordinatorContext,
    /// Cancelled on Ctrl-C.
    pub cancel: CancellationToken,
}

impl CliContext {
    pub const fn coordinator(&self) -> &CoordinatorContext {
        &self.coordinator
    }

    pub const fn schedule(&self) -> &CommercialScheduleService {
        self.coordinator.schedule()
    }

    pub fn catalog(&self) -> &ChannelCatalog {
        self.coordinator.catalog()
    }

    pub fn config(&self) -> &TagVaultConfig {
        self.coordinator.config()
    }

    pub const fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Bootstrap the CLI application with the filesystem target probe.
///
/// Replica pools connect lazily, so an offline replica does not fail
/// startup.
pub fn bootstrap(config: &TagVaultConfig) -> Result<CliContext> {
    bootstrap_with(config, Arc::new(FsTargetProbe))
}

/// Bootstrap with a custom target probe (for testing).
pub fn bootstrap_with(config: &TagVaultConfig, probe: Arc<dyn TargetProbe>) -> Result<CliContext> {
    let coordinator = ReplicaFactory::build_context(config, probe)?;
    Ok(CliContext {
        coordinator,
        cancel: CancellationToken::new(),
    })
}
