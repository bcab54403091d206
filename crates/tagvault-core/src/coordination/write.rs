//! Fan-out and self-healing writes.
//!
//! Both modes attempt every profile independently. One profile's failure
//! never skips or aborts another's attempt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::accumulator::{Accumulator, AttemptResult};
use super::registry::{ProfileHandle, ProfileRegistry};
use crate::domain::{DbValue, LogicalDatabaseName, StatementParams};
use crate::error::CoreError;
use crate::outcome::{AttemptError, OutcomeStatus, ProfileFailure, WriteOutcome};

/// What a successful per-profile attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    /// Fan-out statement executed (row count irrelevant).
    Executed,
    /// Self-healing update matched at least one row.
    Updated,
    /// Self-healing update matched nothing; the insert ran instead.
    Inserted,
}

/// Applies writes to every profile of a group.
#[derive(Debug, Clone)]
pub struct WriteCoordinator {
    registry: Arc<ProfileRegistry>,
    attempt_timeout: Duration,
}

impl WriteCoordinator {
    pub const fn new(registry: Arc<ProfileRegistry>, attempt_timeout: Duration) -> Self {
        Self {
            registry,
            attempt_timeout,
        }
    }

    /// Execute `sql` on every profile of `database`.
    ///
    /// A statement that executes without error counts as a success even if
    /// it affected zero rows.
    pub async fn fan_out_write<P>(
        &self,
        database: &LogicalDatabaseName,
        sql: &str,
        params: &P,
        cancel: &CancellationToken,
    ) -> Result<WriteOutcome, CoreError>
    where
        P: StatementParams + ?Sized,
    {
        let profiles = self.registry.resolve(database)?;
        let sql: Arc<str> = Arc::from(sql);
        let values: Arc<[DbValue]> = params.values().into();

        let outcome = self
            .attempt_all(&profiles, cancel, move |handle| {
                let sql = Arc::clone(&sql);
                let values = Arc::clone(&values);
                async move {
                    handle.endpoint().execute(&sql, &values).await?;
                    Ok::<_, AttemptError>(Applied::Executed)
                }
            })
            .await;

        log_outcome("fan-out write", database, &outcome);
        Ok(outcome)
    }

    /// Update on every profile, inserting on each profile where the update
    /// matched no rows.
    ///
    /// A zero-row update is taken to mean the row is missing on that
    /// replica. A row deleted concurrently between the two statements would
    /// be re-inserted; this is an approximation of upsert, not a guarantee.
    pub async fn self_healing_write<U, I>(
        &self,
        database: &LogicalDatabaseName,
        update_sql: &str,
        insert_sql: &str,
        update_params: &U,
        insert_params: &I,
        cancel: &CancellationToken,
    ) -> Result<WriteOutcome, CoreError>
    where
        U: StatementParams + ?Sized,
        I: StatementParams + ?Sized,
    {
        let profiles = self.registry.resolve(database)?;
        let update_sql: Arc<str> = Arc::from(update_sql);
        let insert_sql: Arc<str> = Arc::from(insert_sql);
        let update_values: Arc<[DbValue]> = update_params.values().into();
        let insert_values: Arc<[DbValue]> = insert_params.values().into();

        let outcome = self
            .attempt_all(&profiles, cancel, move |handle| {
                let update_sql = Arc::clone(&update_sql);
                let insert_sql = Arc::clone(&insert_sql);
                let update_values = Arc::clone(&update_values);
                let insert_values = Arc::clone(&insert_values);
                async move {
                    let endpoint = handle.endpoint();
                    let affected = endpoint.execute(&update_sql, &update_values).await?;
                    if affected > 0 {
                        return Ok(Applied::Updated);
                    }
                    debug!(profile = %handle.name(), "Update matched no rows; inserting");
                    endpoint.execute(&insert_sql, &insert_values).await?;
                    Ok::<_, AttemptError>(Applied::Inserted)
                }
            })
            .await;

        log_outcome("self-healing write", database, &outcome);
        Ok(outcome)
    }

    /// Run `attempt` once per profile, concurrently, and merge the results.
    ///
    /// Cancellation stops further spawns; attempts already started are
    /// awaited to completion.
    async fn attempt_all<F, Fut>(
        &self,
        profiles: &[ProfileHandle],
        cancel: &CancellationToken,
        attempt: F,
    ) -> WriteOutcome
    where
        F: Fn(ProfileHandle) -> Fut,
        Fut: Future<Output = AttemptResult<Applied>> + Send + 'static,
    {
        let accumulator = Arc::new(Accumulator::with_capacity(profiles.len()));
        let timeout = self.attempt_timeout;
        let mut tasks = JoinSet::new();

        for (index, handle) in profiles.iter().enumerate() {
            if cancel.is_cancelled() {
                accumulator.record(index, Err(AttemptError::Cancelled));
                continue;
            }
            let fut = attempt(handle.clone());
            let accumulator = Arc::clone(&accumulator);
            tasks.spawn(async move {
                let result = tokio::time::timeout(timeout, fut)
                    .await
                    .unwrap_or(Err(AttemptError::Timeout(timeout)));
                accumulator.record(index, result);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(join_error) = joined {
                warn!(error = %join_error, "Write attempt task aborted");
            }
        }

        let mut outcome = WriteOutcome::default();
        let mut inserted = 0usize;
        for (index, result) in accumulator.drain(profiles.len()) {
            let profile = profiles[index].name().to_string();
            match result {
                Ok(applied) => {
                    outcome.success_count += 1;
                    if applied == Applied::Inserted {
                        inserted += 1;
                    }
                    debug!(profile = %profile, ?applied, "Write applied");
                }
                Err(error) => {
                    debug!(profile = %profile, %error, "Write attempt failed");
                    outcome.failures.push(ProfileFailure { profile, error });
                }
            }
        }
        if inserted > 0 {
            info!(inserted, "Self-healing write inserted missing rows");
        }
        outcome
    }
}

fn log_outcome(operation: &str, database: &LogicalDatabaseName, outcome: &WriteOutcome) {
    match outcome.status() {
        OutcomeStatus::Complete => info!(
            database = %database,
            success_count = outcome.success_count,
            "{operation} applied on every profile"
        ),
        OutcomeStatus::Partial => warn!(
            database = %database,
            success_count = outcome.success_count,
            failed = outcome.failures.len(),
            detail = %outcome.error_detail().unwrap_or_default(),
            "{operation} partially applied"
        ),
        OutcomeStatus::TotalFailure => error!(
            database = %database,
            detail = %outcome.error_detail().unwrap_or_default(),
            "{operation} failed on every profile"
        ),
    }
}
