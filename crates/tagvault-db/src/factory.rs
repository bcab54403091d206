//! Composition utilities for building a `CoordinatorContext` over `SQLite`
//! replicas.
//!
//! Construction only; no coordination logic lives here.

use std::sync::Arc;

use anyhow::Context;
use tagvault_core::{
    ConnectionProfile, CoordinatorContext, ProfileHandle, ProfileRegistry, TagVaultConfig,
    TargetProbe, validate_config,
};
use tracing::info;

use crate::endpoint::SqliteReplicaEndpoint;
use crate::statements::schedule_statements;

/// Factory for replica endpoints and the coordinator context.
pub struct ReplicaFactory;

impl ReplicaFactory {
    /// Create a lazily connected endpoint for one profile.
    pub fn endpoint(profile: &ConnectionProfile) -> anyhow::Result<Arc<SqliteReplicaEndpoint>> {
        let endpoint = SqliteReplicaEndpoint::connect_lazy(profile)
            .with_context(|| format!("building endpoint for profile {}", profile.name))?;
        Ok(Arc::new(endpoint))
    }

    /// Register every configured logical database and its profiles.
    pub fn build_registry(config: &TagVaultConfig) -> anyhow::Result<ProfileRegistry> {
        let mut registry = ProfileRegistry::new();
        for (database, profiles) in &config.databases {
            let handles = profiles
                .iter()
                .map(|profile| -> anyhow::Result<ProfileHandle> {
                    Ok(ProfileHandle::new(profile.clone(), Self::endpoint(profile)?))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            registry.register(database.clone(), handles)?;
            info!(database = %database, profiles = profiles.len(), "Registered logical database");
        }
        Ok(registry)
    }

    /// Validate `config` and wire the full context.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let ctx = ReplicaFactory::build_context(&config, Arc::new(FsTargetProbe))?;
    /// let report = ctx.schedule().save("KXYZ", &artifact, &cancel).await?;
    /// ```
    pub fn build_context(
        config: &TagVaultConfig,
        probe: Arc<dyn TargetProbe>,
    ) -> anyhow::Result<CoordinatorContext> {
        validate_config(config)?;
        let registry = Self::build_registry(config)?;
        Ok(CoordinatorContext::new(
            config,
            registry,
            probe,
            schedule_statements(),
        ))
    }
}

/// A set of file-backed replicas with the schema applied, for tests.
///
/// Every replica lives under one temporary directory that is removed on drop.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestReplicaSet {
    dir: tempfile::TempDir,
    profiles: Vec<ConnectionProfile>,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestReplicaSet {
    /// Logical database name used by [`Self::config`].
    pub const DATABASE: &'static str = "schedule";

    /// Create `count` replicas named `replica0`, `replica1`, ...
    pub async fn new(count: usize) -> anyhow::Result<Self> {
        let dir = tempfile::TempDir::new()?;
        let mut profiles = Vec::with_capacity(count);
        for index in 0..count {
            let path = dir.path().join(format!("replica{index}/schedule.db"));
            let profile = ConnectionProfile::new(
                format!("replica{index}"),
                format!("sqlite://{}", path.display()),
            );
            let pool = crate::setup::initialize_replica(&profile).await?;
            pool.close().await;
            profiles.push(profile);
        }
        Ok(Self { dir, profiles })
    }

    /// Append a profile whose database file does not exist.
    #[must_use]
    pub fn with_offline_profile(mut self, name: &str) -> Self {
        let path = self.dir.path().join(format!("{name}-unmounted/schedule.db"));
        let mut profile = ConnectionProfile::new(name, format!("sqlite://{}", path.display()));
        profile.connect_timeout_ms = 500;
        self.profiles.push(profile);
        self
    }

    pub fn profiles(&self) -> &[ConnectionProfile] {
        &self.profiles
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// A valid configuration over these replicas.
    pub fn config(&self, channels: Vec<tagvault_core::ChannelTargets>) -> TagVaultConfig {
        TagVaultConfig {
            databases: std::iter::once((
                tagvault_core::LogicalDatabaseName::from(Self::DATABASE),
                self.profiles.clone(),
            ))
            .collect(),
            catalog_database: tagvault_core::LogicalDatabaseName::from(Self::DATABASE),
            channels,
            authorized_principals: Vec::new(),
            catalog_ttl_secs: tagvault_core::DEFAULT_CATALOG_TTL_SECS,
            attempt_timeout_ms: 2_000,
            artifact_subdir: tagvault_core::DEFAULT_ARTIFACT_SUBDIR.to_string(),
        }
    }

    /// Direct pool on replica `index` for seeding and assertions.
    pub fn pool(&self, index: usize) -> anyhow::Result<sqlx::SqlitePool> {
        let profile = self
            .profiles
            .get(index)
            .with_context(|| format!("no replica at index {index}"))?;
        Ok(SqliteReplicaEndpoint::connect_lazy(profile)?.pool().clone())
    }

    /// Insert a channel row on replica `index`.
    pub async fn seed_channel(&self, index: usize, name: &str) -> anyhow::Result<()> {
        let pool = self.pool(index)?;
        sqlx::query("INSERT INTO channels (name) VALUES (?1)")
            .bind(name)
            .execute(&pool)
            .await?;
        Ok(())
    }

    /// Count commercial rows on replica `index` whose stored path is `path`.
    pub async fn rows_with_path(&self, index: usize, path: &str) -> anyhow::Result<i64> {
        let pool = self.pool(index)?;
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM playlist_events WHERE category = 'COMMERCIALS' AND file_path = ?1",
        )
        .bind(path)
        .fetch_one(&pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use std::time::Duration;
    use tagvault_core::{
        ChannelTargets, CutEntry, FsTargetProbe, OutcomeStatus, PlaylistArtifact,
    };
    use tokio_util::sync::CancellationToken;

    fn artifact(title: &str) -> PlaylistArtifact {
        PlaylistArtifact::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            title,
        )
        .unwrap()
        .with_cut(CutEntry::new("/audio/spot.wav", Duration::from_secs(30), "Spot").unwrap())
    }

    struct Harness {
        replicas: TestReplicaSet,
        targets: Vec<tempfile::TempDir>,
        ctx: CoordinatorContext,
    }

    async fn harness(replicas: TestReplicaSet) -> Harness {
        for index in 0..replicas.profiles().len() {
            // The offline profile cannot be seeded; skip it.
            let _ = replicas.seed_channel(index, "KXYZ").await;
        }
        let targets: Vec<tempfile::TempDir> =
            (0..2).map(|_| tempfile::TempDir::new().unwrap()).collect();
        let config = replicas.config(vec![ChannelTargets {
            name: "KXYZ".to_string(),
            targets: targets.iter().map(|t| t.path().to_path_buf()).collect(),
        }]);
        let ctx = ReplicaFactory::build_context(&config, Arc::new(FsTargetProbe)).unwrap();
        Harness {
            replicas,
            targets,
            ctx,
        }
    }

    fn stored_path(h: &Harness, artifact: &PlaylistArtifact) -> String {
        h.targets[0]
            .path()
            .join(h.ctx.schedule().relative_path(artifact))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_save_writes_files_and_rows_everywhere() {
        let h = harness(TestReplicaSet::new(2).await.unwrap()).await;
        let cancel = CancellationToken::new();
        let promo = artifact("PROMO");

        let report = h.ctx.schedule().save("kxyz", &promo, &cancel).await.unwrap();
        assert_eq!(report.status(), OutcomeStatus::Complete);
        assert_eq!(
            report.summary(),
            "saved to 2 of 2 targets; database rows on 2 of 2 profiles"
        );

        // Saving again updates in place instead of inserting a duplicate.
        h.ctx.schedule().save("KXYZ", &promo, &cancel).await.unwrap();
        let path = stored_path(&h, &promo);
        for index in 0..2 {
            assert_eq!(h.replicas.rows_with_path(index, &path).await.unwrap(), 1);
        }

        let taken = h
            .ctx
            .schedule()
            .slot_taken(promo.scheduled_date(), promo.scheduled_time(), &cancel)
            .await
            .unwrap();
        assert!(taken);
    }

    #[tokio::test]
    async fn test_offline_replica_is_reported_not_fatal() {
        let replicas = TestReplicaSet::new(1).await.unwrap().with_offline_profile("rack");
        let h = harness(replicas).await;
        let cancel = CancellationToken::new();

        let report = h
            .ctx
            .schedule()
            .save("KXYZ", &artifact("PROMO"), &cancel)
            .await
            .unwrap();
        assert_eq!(report.status(), OutcomeStatus::Partial);
        assert_eq!(report.rows.success_count, 1);
        assert_eq!(report.rows.failures[0].profile, "rack");
        assert!(report.rows.failures[0].error.is_connectivity());

        let channels = h.ctx.catalog().get(false, &cancel).await;
        assert_eq!(channels.len(), 1);
        assert!(!channels[0].is_from_config);
    }

    #[tokio::test]
    async fn test_rename_moves_row_and_files() {
        let h = harness(TestReplicaSet::new(2).await.unwrap()).await;
        let cancel = CancellationToken::new();
        let old = artifact("PROMO");
        h.ctx.schedule().save("KXYZ", &old, &cancel).await.unwrap();

        let mut new = old.clone();
        new.set_title("SALE").unwrap();
        let report = h
            .ctx
            .schedule()
            .rename("KXYZ", &old, &new, &cancel)
            .await
            .unwrap();
        assert_eq!(report.status(), OutcomeStatus::Complete);

        for index in 0..2 {
            assert_eq!(
                h.replicas
                    .rows_with_path(index, &stored_path(&h, &old))
                    .await
                    .unwrap(),
                0
            );
            assert_eq!(
                h.replicas
                    .rows_with_path(index, &stored_path(&h, &new))
                    .await
                    .unwrap(),
                1
            );
        }
        let listing = h.ctx.schedule().list("KXYZ", &cancel).await.unwrap();
        assert_eq!(listing.artifacts.len(), 1);
        assert_eq!(listing.artifacts[0].1.title(), "SALE");
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_files() {
        let h = harness(TestReplicaSet::new(2).await.unwrap()).await;
        let cancel = CancellationToken::new();
        let promo = artifact("PROMO");
        h.ctx.schedule().save("KXYZ", &promo, &cancel).await.unwrap();

        let report = h.ctx.schedule().delete("KXYZ", &promo, &cancel).await.unwrap();
        assert_eq!(report.status(), OutcomeStatus::Complete);
        assert!(
            !h.ctx
                .schedule()
                .slot_taken(promo.scheduled_date(), promo.scheduled_time(), &cancel)
                .await
                .unwrap()
        );
        assert!(h.ctx.schedule().list("KXYZ", &cancel).await.unwrap().artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_self_healing_reinserts_row_missing_on_one_replica() {
        let h = harness(TestReplicaSet::new(2).await.unwrap()).await;
        let cancel = CancellationToken::new();
        let promo = artifact("PROMO");
        h.ctx.schedule().save("KXYZ", &promo, &cancel).await.unwrap();

        let pool = h.replicas.pool(1).unwrap();
        sqlx::query("DELETE FROM playlist_events").execute(&pool).await.unwrap();

        h.ctx.schedule().save("KXYZ", &promo, &cancel).await.unwrap();
        let path = stored_path(&h, &promo);
        assert_eq!(h.replicas.rows_with_path(0, &path).await.unwrap(), 1);
        assert_eq!(h.replicas.rows_with_path(1, &path).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_build_context_rejects_invalid_config() {
        let replicas = TestReplicaSet::new(1).await.unwrap();
        let mut config = replicas.config(Vec::new());
        config.attempt_timeout_ms = 0;
        assert!(ReplicaFactory::build_context(&config, Arc::new(FsTargetProbe)).is_err());
    }
}
