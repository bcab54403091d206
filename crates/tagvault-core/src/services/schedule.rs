//! Commercial schedule persistence.
//!
//! Each artifact is persisted twice, independently: the TAG file through the
//! file replicator and the schedule row through the write coordinator. The
//! two are not transactionally linked; the report carries both outcomes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::ChannelCatalog;
use crate::coordination::{ReadCoordinator, WriteCoordinator};
use crate::domain::{
    ArtifactError, Channel, CommercialRowParams, LogicalDatabaseName, PathKeyParams,
    PlaylistArtifact, RenameRowParams, RowCursor, SlotKeyParams, TAG_EXTENSION, Target,
};
use crate::error::CoreError;
use crate::outcome::{FileOpOutcome, OutcomeStatus, RepairOutcome, WriteOutcome};
use crate::replication::FileReplicator;

/// SQL used by the schedule service, supplied by the database adapter.
///
/// Placeholders are positional and must match the parameter structs:
/// - `list_channels`: no parameters, one channel name per row
/// - `count_slot`: [`SlotKeyParams`], a single integer row
/// - `update_by_slot` / `insert_commercial`: [`CommercialRowParams`]
/// - `update_by_previous_path`: [`RenameRowParams`]
/// - `delete_by_path`: [`PathKeyParams`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleStatements {
    pub list_channels: String,
    pub count_slot: String,
    pub update_by_slot: String,
    pub insert_commercial: String,
    pub update_by_previous_path: String,
    pub delete_by_path: String,
}

/// File and database outcomes of one persistence call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReport {
    pub files: FileOpOutcome,
    pub rows: WriteOutcome,
}

impl PersistReport {
    /// Overall status: complete only if both sides are, total failure only
    /// if neither side succeeded anywhere.
    pub fn status(&self) -> OutcomeStatus {
        match (self.files.status(), self.rows.status()) {
            (OutcomeStatus::Complete, OutcomeStatus::Complete) => OutcomeStatus::Complete,
            (OutcomeStatus::TotalFailure, OutcomeStatus::TotalFailure) => {
                OutcomeStatus::TotalFailure
            }
            _ => OutcomeStatus::Partial,
        }
    }

    /// e.g. `saved to 2 of 3 targets; database rows on 1 of 2 profiles`.
    pub fn summary(&self) -> String {
        format!(
            "saved to {} of {} targets; database rows on {} of {} profiles",
            self.files.success_count(),
            self.files.attempted(),
            self.rows.success_count,
            self.rows.attempted()
        )
    }
}

impl fmt::Display for PersistReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Artifacts parsed from one target, with per-file parse failures.
#[derive(Debug, Clone)]
pub struct ArtifactListing {
    /// The target the listing was read from.
    pub source: Target,
    /// Parsed artifacts sorted by file path.
    pub artifacts: Vec<(PathBuf, PlaylistArtifact)>,
    pub failures: Vec<(PathBuf, ArtifactError)>,
}

/// Saves, renames, deletes, repairs and lists commercial playlists.
#[derive(Debug, Clone)]
pub struct CommercialScheduleService {
    reader: ReadCoordinator,
    writer: WriteCoordinator,
    files: FileReplicator,
    catalog: Arc<ChannelCatalog>,
    database: LogicalDatabaseName,
    statements: Arc<ScheduleStatements>,
    artifact_subdir: PathBuf,
}

impl CommercialScheduleService {
    pub fn new(
        reader: ReadCoordinator,
        writer: WriteCoordinator,
        files: FileReplicator,
        catalog: Arc<ChannelCatalog>,
        database: LogicalDatabaseName,
        statements: Arc<ScheduleStatements>,
        artifact_subdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reader,
            writer,
            files,
            catalog,
            database,
            statements,
            artifact_subdir: artifact_subdir.into(),
        }
    }

    /// Resolve a usable channel, loading the catalog if it has not been yet.
    pub async fn channel(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Channel, CoreError> {
        let channel = match self.catalog.get_by_name(name) {
            Some(channel) => channel,
            None => {
                self.catalog.get(false, cancel).await;
                self.catalog
                    .get_by_name(name)
                    .ok_or_else(|| CoreError::UnknownChannel(name.to_string()))?
            }
        };
        if !channel.is_usable() {
            return Err(CoreError::ChannelNotUsable(channel.name));
        }
        Ok(channel)
    }

    /// Path of an artifact relative to each target root.
    pub fn relative_path(&self, artifact: &PlaylistArtifact) -> PathBuf {
        self.artifact_subdir.join(artifact.file_name())
    }

    /// Path recorded in the schedule row: the artifact on the configured
    /// primary target, whether or not it is reachable now.
    fn stored_path(channel: &Channel, relative: &Path) -> Result<String, CoreError> {
        channel
            .primary_target()
            .map(|target| target.resolve(relative).to_string_lossy().into_owned())
            .ok_or_else(|| CoreError::ChannelNotUsable(channel.name.clone()))
    }

    fn row_params(
        channel: &Channel,
        artifact: &PlaylistArtifact,
        file_path: String,
    ) -> CommercialRowParams {
        CommercialRowParams {
            channel: channel.name.clone(),
            scheduled_date: artifact.scheduled_date(),
            scheduled_time: artifact.scheduled_time(),
            file_path,
            title: artifact.title().to_string(),
            duration_ms: i64::try_from(artifact.total_duration().as_millis()).unwrap_or(i64::MAX),
            updated_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Write the artifact to every target and upsert its schedule row.
    pub async fn save(
        &self,
        channel: &str,
        artifact: &PlaylistArtifact,
        cancel: &CancellationToken,
    ) -> Result<PersistReport, CoreError> {
        let channel = self.channel(channel, cancel).await?;
        let relative = self.relative_path(artifact);
        let content = artifact.to_content();

        let files = self
            .files
            .write(&channel.targets, &relative, content.as_bytes(), cancel)
            .await;

        let row = Self::row_params(&channel, artifact, Self::stored_path(&channel, &relative)?);
        let rows = self
            .writer
            .self_healing_write(
                &self.database,
                &self.statements.update_by_slot,
                &self.statements.insert_commercial,
                &row,
                &row,
                cancel,
            )
            .await?;

        Ok(self.report("save", &artifact.display_name(), files, rows))
    }

    /// Replace `previous` with `next`: new file written, old file removed,
    /// and the row found by its previous path rewritten.
    pub async fn rename(
        &self,
        channel: &str,
        previous: &PlaylistArtifact,
        next: &PlaylistArtifact,
        cancel: &CancellationToken,
    ) -> Result<PersistReport, CoreError> {
        let channel = self.channel(channel, cancel).await?;
        let old_relative = self.relative_path(previous);
        let new_relative = self.relative_path(next);

        let files = self
            .files
            .rename(
                &channel.targets,
                &old_relative,
                &new_relative,
                next.to_content().as_bytes(),
                cancel,
            )
            .await;

        let row = Self::row_params(&channel, next, Self::stored_path(&channel, &new_relative)?);
        let rename = RenameRowParams {
            previous_path: Self::stored_path(&channel, &old_relative)?,
            row: row.clone(),
        };
        let rows = self
            .writer
            .self_healing_write(
                &self.database,
                &self.statements.update_by_previous_path,
                &self.statements.insert_commercial,
                &rename,
                &row,
                cancel,
            )
            .await?;

        Ok(self.report("rename", &next.display_name(), files, rows))
    }

    /// Remove the artifact file everywhere and delete its row on every profile.
    pub async fn delete(
        &self,
        channel: &str,
        artifact: &PlaylistArtifact,
        cancel: &CancellationToken,
    ) -> Result<PersistReport, CoreError> {
        let channel = self.channel(channel, cancel).await?;
        let relative = self.relative_path(artifact);

        let files = self.files.delete(&channel.targets, &relative, cancel).await;
        let key = PathKeyParams {
            file_path: Self::stored_path(&channel, &relative)?,
        };
        let rows = self
            .writer
            .fan_out_write(&self.database, &self.statements.delete_by_path, &key, cancel)
            .await?;

        Ok(self.report("delete", &artifact.display_name(), files, rows))
    }

    /// Copy the artifact onto every accessible target that lacks it.
    pub async fn repair(
        &self,
        channel: &str,
        artifact: &PlaylistArtifact,
        cancel: &CancellationToken,
    ) -> Result<RepairOutcome, CoreError> {
        let channel = self.channel(channel, cancel).await?;
        let relative = self.relative_path(artifact);
        Ok(self
            .files
            .replicate_missing(&channel.targets, &relative, cancel)
            .await)
    }

    /// Whether any replica holds a commercial row at this slot.
    pub async fn slot_taken(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        cancel: &CancellationToken,
    ) -> Result<bool, CoreError> {
        let params = SlotKeyParams {
            scheduled_date: date,
            scheduled_time: time,
        };
        let outcome = self
            .reader
            .race_read(
                &self.database,
                &self.statements.count_slot,
                &params,
                map_count,
                cancel,
            )
            .await?;

        let source = outcome.source_profile.clone();
        match outcome.value {
            Some(count) => {
                let profile = source.as_deref().unwrap_or_default();
                debug!(%date, %time, count, profile, "Slot checked");
                Ok(count > 0)
            }
            None => Err(CoreError::TotalFailure {
                operation: "slot lookup",
                detail: outcome.error_detail.unwrap_or_default(),
            }),
        }
    }

    /// Parse every TAG file in the channel's first accessible target.
    ///
    /// A file that fails to read or parse is reported on its own and the
    /// rest of the listing continues.
    pub async fn list(
        &self,
        channel: &str,
        cancel: &CancellationToken,
    ) -> Result<ArtifactListing, CoreError> {
        let channel = self.channel(channel, cancel).await?;
        let source = self
            .files
            .accessible_targets(&channel)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NoAccessibleTarget(channel.name.clone()))?;

        let dir = source.resolve(&self.artifact_subdir);
        let mut listing = ArtifactListing {
            source,
            artifacts: Vec::new(),
            failures: Vec::new(),
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "No artifact directory yet");
                return Ok(listing);
            }
            Err(e) => {
                return Err(CoreError::TotalFailure {
                    operation: "artifact listing",
                    detail: format!("{}: {e}", dir.display()),
                });
            }
        };

        let mut paths = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    let is_tag = path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(TAG_EXTENSION));
                    if is_tag {
                        paths.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        dir = %dir.display(),
                        error = %e,
                        "Artifact directory scan stopped early"
                    );
                    break;
                }
            }
        }
        paths.sort();

        let primary = channel.primary_target();
        for path in paths {
            let parsed = match tokio::fs::read_to_string(&path).await {
                Ok(content) => PlaylistArtifact::parse(&content, primary),
                Err(e) => Err(ArtifactError::Parse {
                    line: 0,
                    reason: e.to_string(),
                }),
            };
            match parsed {
                Ok(artifact) => listing.artifacts.push((path, artifact)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable artifact");
                    listing.failures.push((path, e));
                }
            }
        }

        info!(
            channel = %channel.name,
            target = %listing.source,
            artifacts = listing.artifacts.len(),
            failures = listing.failures.len(),
            "Listed artifacts"
        );
        Ok(listing)
    }

    fn report(
        &self,
        operation: &str,
        artifact: &str,
        files: FileOpOutcome,
        rows: WriteOutcome,
    ) -> PersistReport {
        let report = PersistReport { files, rows };
        match report.status() {
            OutcomeStatus::Complete => {
                info!(database = %self.database, artifact, "{operation}: {}", report.summary());
            }
            OutcomeStatus::Partial | OutcomeStatus::TotalFailure => {
                warn!(database = %self.database, artifact, "{operation}: {}", report.summary());
            }
        }
        report
    }
}

fn map_count(cursor: RowCursor) -> Result<i64, String> {
    cursor
        .first()
        .get_index(0)
        .and_then(|value| value.as_i64())
        .ok_or_else(|| "slot count is not an integer".to_string())
}
