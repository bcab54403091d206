//! Replicated file operations over a channel's targets.
//!
//! Every call probes its targets first; unreachable targets are recorded as
//! connectivity failures and the operation runs concurrently on the rest.
//! One target failing never skips or aborts another.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::atomic::{file_exists, remove_if_present, write_atomic};
use crate::coordination::accumulator::{Accumulator, AttemptResult};
use crate::domain::{Channel, Target};
use crate::outcome::{AttemptError, FailedPath, FileOpOutcome, OutcomeStatus, RepairOutcome};
use crate::ports::TargetProbe;

/// Per-target result of a repair attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepairAction {
    Copied,
    AlreadyPresent,
}

#[derive(Clone)]
pub struct FileReplicator {
    probe: Arc<dyn TargetProbe>,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for FileReplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReplicator")
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl FileReplicator {
    pub fn new(probe: Arc<dyn TargetProbe>, attempt_timeout: Duration) -> Self {
        Self {
            probe,
            attempt_timeout,
        }
    }

    /// Targets of `channel` reachable right now, in configuration order.
    ///
    /// Recomputed on every call.
    pub async fn accessible_targets(&self, channel: &Channel) -> Vec<Target> {
        let flags = self.probe_all(&channel.targets).await;
        channel
            .targets
            .iter()
            .zip(flags)
            .filter_map(|(target, ok)| ok.then(|| target.clone()))
            .collect()
    }

    /// Atomically write `content` to `relative` on every accessible target.
    pub async fn write(
        &self,
        targets: &[Target],
        relative: &Path,
        content: &[u8],
        cancel: &CancellationToken,
    ) -> FileOpOutcome {
        let content: Arc<[u8]> = Arc::from(content);
        let outcome = self
            .attempt_all(targets, relative, cancel, move |path| {
                let content = Arc::clone(&content);
                async move {
                    write_atomic(&path, &content).await?;
                    Ok::<_, AttemptError>(())
                }
            })
            .await;
        log_outcome("file write", relative, &outcome);
        outcome
    }

    /// Move `old_relative` to `new_relative` on every accessible target,
    /// writing `content` as the new file.
    ///
    /// Names equal ignoring case degrade to a plain write of the new name.
    /// A target where the new copy landed but the old one could not be
    /// removed is recorded as failed.
    pub async fn rename(
        &self,
        targets: &[Target],
        old_relative: &Path,
        new_relative: &Path,
        content: &[u8],
        cancel: &CancellationToken,
    ) -> FileOpOutcome {
        if same_name_ignoring_case(old_relative, new_relative) {
            debug!(path = %new_relative.display(), "Rename to same name; writing in place");
            return self.write(targets, new_relative, content, cancel).await;
        }

        let content: Arc<[u8]> = Arc::from(content);
        let old_relative: Arc<Path> = Arc::from(old_relative);
        let outcome = self
            .attempt_all_with_target(targets, new_relative, cancel, move |target, new_path| {
                let content = Arc::clone(&content);
                let old_path = target.resolve(&old_relative);
                async move {
                    write_atomic(&new_path, &content).await?;
                    remove_if_present(&old_path).await.map_err(|e| {
                        AttemptError::Io(format!(
                            "new copy written but {} not removed: {e}",
                            old_path.display()
                        ))
                    })?;
                    Ok::<_, AttemptError>(())
                }
            })
            .await;
        log_outcome("file rename", new_relative, &outcome);
        outcome
    }

    /// Delete `relative` from every accessible target. Absence is success.
    pub async fn delete(
        &self,
        targets: &[Target],
        relative: &Path,
        cancel: &CancellationToken,
    ) -> FileOpOutcome {
        let outcome = self
            .attempt_all(targets, relative, cancel, |path| async move {
                let existed = remove_if_present(&path).await?;
                debug!(path = %path.display(), existed, "Delete attempted");
                Ok::<_, AttemptError>(())
            })
            .await;
        log_outcome("file delete", relative, &outcome);
        outcome
    }

    /// Copy `relative` from the primary accessible target to every
    /// accessible target lacking it.
    ///
    /// Existing copies are left alone and reported in `already_present`,
    /// so repeating a repair copies nothing.
    pub async fn replicate_missing(
        &self,
        targets: &[Target],
        relative: &Path,
        cancel: &CancellationToken,
    ) -> RepairOutcome {
        let flags = self.probe_all(targets).await;
        let mut outcome = RepairOutcome::default();
        let Some(primary_index) = flags.iter().position(|ok| *ok) else {
            outcome.files.failed_paths = inaccessible_failures(targets, relative, &flags);
            log_outcome("file repair", relative, &outcome.files);
            return outcome;
        };
        let primary_path = targets[primary_index].resolve(relative);
        outcome.files.primary_path = Some(primary_path.clone());

        let read = tokio::time::timeout(self.attempt_timeout, tokio::fs::read(&primary_path))
            .await
            .map_err(|_| AttemptError::Timeout(self.attempt_timeout))
            .and_then(|read| read.map_err(AttemptError::from));
        let source: Arc<[u8]> = match read {
            Ok(bytes) => Arc::from(bytes),
            Err(error) => {
                // Without a source copy nothing else can be repaired.
                outcome.files.failed_paths = inaccessible_failures(targets, relative, &flags);
                outcome.files.failed_paths.push(FailedPath {
                    path: primary_path,
                    error,
                });
                log_outcome("file repair", relative, &outcome.files);
                return outcome;
            }
        };

        let accumulator = Arc::new(Accumulator::with_capacity(targets.len()));
        let mut tasks = JoinSet::new();
        for (index, target) in targets.iter().enumerate() {
            if !flags[index] {
                accumulator.record(index, Err(inaccessible(target)));
                continue;
            }
            if index == primary_index {
                accumulator.record(index, Ok(RepairAction::AlreadyPresent));
                continue;
            }
            if cancel.is_cancelled() {
                accumulator.record(index, Err(AttemptError::Cancelled));
                continue;
            }
            let path = target.resolve(relative);
            let source = Arc::clone(&source);
            let accumulator = Arc::clone(&accumulator);
            let timeout = self.attempt_timeout;
            tasks.spawn(async move {
                let attempt = async move {
                    if file_exists(&path).await? {
                        return Ok(RepairAction::AlreadyPresent);
                    }
                    write_atomic(&path, &source).await?;
                    Ok::<_, AttemptError>(RepairAction::Copied)
                };
                let result = tokio::time::timeout(timeout, attempt)
                    .await
                    .unwrap_or(Err(AttemptError::Timeout(timeout)));
                accumulator.record(index, result);
            });
        }
        join_quietly(&mut tasks).await;

        for (index, result) in accumulator.drain(targets.len()) {
            let path = targets[index].resolve(relative);
            match result {
                Ok(RepairAction::Copied) => {
                    outcome.files.successful_paths.insert(path);
                }
                Ok(RepairAction::AlreadyPresent) => outcome.already_present.push(path),
                Err(error) => outcome.files.failed_paths.push(FailedPath { path, error }),
            }
        }

        if outcome.files.failed_paths.is_empty() {
            info!(
                path = %relative.display(),
                repaired = outcome.repaired(),
                already_present = outcome.already_present.len(),
                "File repair finished"
            );
        } else {
            warn!(
                path = %relative.display(),
                repaired = outcome.repaired(),
                failed = outcome.files.failed_paths.len(),
                detail = %outcome.files.error_detail().unwrap_or_default(),
                "File repair incomplete"
            );
        }
        outcome
    }

    async fn probe_all(&self, targets: &[Target]) -> Vec<bool> {
        let mut tasks = JoinSet::new();
        for (index, target) in targets.iter().cloned().enumerate() {
            let probe = Arc::clone(&self.probe);
            let timeout = self.attempt_timeout;
            tasks.spawn(async move {
                let accessible = tokio::time::timeout(timeout, probe.is_accessible(&target))
                    .await
                    .unwrap_or(false);
                (index, accessible)
            });
        }

        let mut flags = vec![false; targets.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, accessible)) => flags[index] = accessible,
                Err(join_error) => warn!(error = %join_error, "Target probe task aborted"),
            }
        }
        flags
    }

    async fn attempt_all<F, Fut>(
        &self,
        targets: &[Target],
        relative: &Path,
        cancel: &CancellationToken,
        attempt: F,
    ) -> FileOpOutcome
    where
        F: Fn(PathBuf) -> Fut,
        Fut: Future<Output = AttemptResult<()>> + Send + 'static,
    {
        self.attempt_all_with_target(targets, relative, cancel, |_, path| attempt(path))
            .await
    }

    /// Probe, then run `attempt` on each accessible target concurrently.
    ///
    /// Cancellation stops further spawns; started attempts run to the end.
    async fn attempt_all_with_target<F, Fut>(
        &self,
        targets: &[Target],
        relative: &Path,
        cancel: &CancellationToken,
        attempt: F,
    ) -> FileOpOutcome
    where
        F: Fn(&Target, PathBuf) -> Fut,
        Fut: Future<Output = AttemptResult<()>> + Send + 'static,
    {
        let flags = self.probe_all(targets).await;
        let accumulator = Arc::new(Accumulator::with_capacity(targets.len()));
        let timeout = self.attempt_timeout;
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().enumerate() {
            if !flags[index] {
                accumulator.record(index, Err(inaccessible(target)));
                continue;
            }
            if cancel.is_cancelled() {
                accumulator.record(index, Err(AttemptError::Cancelled));
                continue;
            }
            let fut = attempt(target, target.resolve(relative));
            let accumulator = Arc::clone(&accumulator);
            tasks.spawn(async move {
                let result = tokio::time::timeout(timeout, fut)
                    .await
                    .unwrap_or(Err(AttemptError::Timeout(timeout)));
                accumulator.record(index, result);
            });
        }
        join_quietly(&mut tasks).await;

        let mut outcome = FileOpOutcome {
            primary_path: flags
                .iter()
                .position(|ok| *ok)
                .map(|index| targets[index].resolve(relative)),
            ..FileOpOutcome::default()
        };
        for (index, result) in accumulator.drain(targets.len()) {
            let path = targets[index].resolve(relative);
            match result {
                Ok(()) => {
                    outcome.successful_paths.insert(path);
                }
                Err(error) => {
                    debug!(path = %path.display(), %error, "File attempt failed");
                    outcome.failed_paths.push(FailedPath { path, error });
                }
            }
        }
        outcome
    }
}

async fn join_quietly(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(join_error) = joined {
            warn!(error = %join_error, "File attempt task aborted");
        }
    }
}

fn inaccessible(target: &Target) -> AttemptError {
    AttemptError::Connectivity(format!("target {target} is not accessible"))
}

fn inaccessible_failures(targets: &[Target], relative: &Path, flags: &[bool]) -> Vec<FailedPath> {
    targets
        .iter()
        .zip(flags)
        .filter(|(_, ok)| !**ok)
        .map(|(target, _)| FailedPath {
            path: target.resolve(relative),
            error: inaccessible(target),
        })
        .collect()
}

fn same_name_ignoring_case(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

fn log_outcome(operation: &str, relative: &Path, outcome: &FileOpOutcome) {
    match outcome.status() {
        OutcomeStatus::Complete => info!(
            path = %relative.display(),
            success_count = outcome.success_count(),
            "{operation} completed on every target"
        ),
        OutcomeStatus::Partial => warn!(
            path = %relative.display(),
            success_count = outcome.success_count(),
            failed = outcome.failed_paths.len(),
            detail = %outcome.error_detail().unwrap_or_default(),
            "{operation} partially completed"
        ),
        OutcomeStatus::TotalFailure => error!(
            path = %relative.display(),
            detail = %outcome.error_detail().unwrap_or_default(),
            "{operation} failed on every target"
        ),
    }
}
