//! `CoordinatorContext` - the once-per-process owner of every coordinator.
//!
//! Built at the adapter's composition root and passed by reference. Nothing
//! in the core reaches for global state.

use std::sync::Arc;

use super::schedule::{CommercialScheduleService, ScheduleStatements};
use crate::catalog::ChannelCatalog;
use crate::config::TagVaultConfig;
use crate::coordination::{ProfileRegistry, ReadCoordinator, WriteCoordinator};
use crate::ports::TargetProbe;
use crate::replication::FileReplicator;

/// Every coordinator, wired from one configuration.
///
/// # Example
///
/// ```ignore
/// let registry = build_registry(&config)?;
/// let ctx = CoordinatorContext::new(&config, registry, Arc::new(FsTargetProbe), statements);
///
/// let channels = ctx.catalog().get(false, &cancel).await;
/// ```
#[derive(Debug)]
pub struct CoordinatorContext {
    config: Arc<TagVaultConfig>,
    registry: Arc<ProfileRegistry>,
    reader: ReadCoordinator,
    writer: WriteCoordinator,
    files: FileReplicator,
    catalog: Arc<ChannelCatalog>,
    schedule: CommercialScheduleService,
}

impl CoordinatorContext {
    pub fn new(
        config: &TagVaultConfig,
        registry: ProfileRegistry,
        probe: Arc<dyn TargetProbe>,
        statements: ScheduleStatements,
    ) -> Self {
        let timeout = config.attempt_timeout();
        let registry = Arc::new(registry);
        let reader = ReadCoordinator::new(Arc::clone(&registry), timeout);
        let writer = WriteCoordinator::new(Arc::clone(&registry), timeout);
        let files = FileReplicator::new(probe, timeout);
        let statements = Arc::new(statements);

        let catalog = Arc::new(ChannelCatalog::new(
            reader.clone(),
            config.catalog_database.clone(),
            statements.list_channels.as_str(),
            config.channels.clone(),
            config.catalog_ttl(),
        ));
        let schedule = CommercialScheduleService::new(
            reader.clone(),
            writer.clone(),
            files.clone(),
            Arc::clone(&catalog),
            config.catalog_database.clone(),
            statements,
            config.artifact_subdir.as_str(),
        );

        Self {
            config: Arc::new(config.clone()),
            registry,
            reader,
            writer,
            files,
            catalog,
            schedule,
        }
    }

    pub fn config(&self) -> &TagVaultConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub const fn reader(&self) -> &ReadCoordinator {
        &self.reader
    }

    pub const fn writer(&self) -> &WriteCoordinator {
        &self.writer
    }

    pub const fn files(&self) -> &FileReplicator {
        &self.files
    }

    pub fn catalog(&self) -> &ChannelCatalog {
        &self.catalog
    }

    pub const fn schedule(&self) -> &CommercialScheduleService {
        &self.schedule
    }
}
