//! Race reads: first profile to produce an accepted result wins.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::ProfileRegistry;
use crate::domain::{DbValue, LogicalDatabaseName, RowCursor, StatementParams};
use crate::error::CoreError;
use crate::outcome::{AttemptError, ProfileFailure, ReadOutcome};

/// Issues one query to every profile of a group and keeps the first result.
#[derive(Debug, Clone)]
pub struct ReadCoordinator {
    registry: Arc<ProfileRegistry>,
    attempt_timeout: Duration,
}

impl ReadCoordinator {
    pub const fn new(registry: Arc<ProfileRegistry>, attempt_timeout: Duration) -> Self {
        Self {
            registry,
            attempt_timeout,
        }
    }

    /// Race `sql` across every profile registered under `database`.
    ///
    /// The mapper receives a cursor already positioned on the first row and
    /// consumes the rest itself. An empty result, an endpoint error, a
    /// timeout or a mapper error is a loss for that profile only. Once a
    /// profile wins, the remaining attempts are cancelled without waiting
    /// for them.
    ///
    /// Returns `Err` only when `database` is not registered.
    pub async fn race_read<T, P, M>(
        &self,
        database: &LogicalDatabaseName,
        sql: &str,
        params: &P,
        mapper: M,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome<T>, CoreError>
    where
        T: Send + 'static,
        P: StatementParams + ?Sized,
        M: Fn(RowCursor) -> Result<T, String> + Send + Sync + 'static,
    {
        let profiles = self.registry.resolve(database)?;
        let sql: Arc<str> = Arc::from(sql);
        let values: Arc<[DbValue]> = params.values().into();
        let mapper = Arc::new(mapper);
        let losers = cancel.child_token();
        let timeout = self.attempt_timeout;

        let mut attempts = JoinSet::new();
        for handle in profiles.iter().cloned() {
            let sql = Arc::clone(&sql);
            let values = Arc::clone(&values);
            let mapper = Arc::clone(&mapper);
            let token = losers.clone();
            attempts.spawn(async move {
                let result = tokio::select! {
                    () = token.cancelled() => Err(AttemptError::Cancelled),
                    fetched = tokio::time::timeout(
                        timeout,
                        handle.endpoint().fetch(&sql, &values),
                    ) => {
                        match fetched {
                            Err(_) => Err(AttemptError::Timeout(timeout)),
                            Ok(Err(e)) => Err(AttemptError::from(e)),
                            Ok(Ok(rows)) => RowCursor::open(rows)
                                .ok_or(AttemptError::EmptyResult)
                                .and_then(|cursor| mapper(cursor).map_err(AttemptError::Mapping)),
                        }
                    }
                };
                (handle.name().to_string(), result)
            });
        }

        let mut reported = HashSet::new();
        let mut failures = Vec::new();

        loop {
            let joined = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    losers.cancel();
                    attempts.abort_all();
                    debug!(database = %database, "Race read cancelled by caller");
                    failures.extend(
                        profiles
                            .iter()
                            .filter(|h| !reported.contains(h.name()))
                            .map(|h| ProfileFailure {
                                profile: h.name().to_string(),
                                error: AttemptError::Cancelled,
                            }),
                    );
                    return Ok(ReadOutcome::lost(failures));
                }
                joined = attempts.join_next() => joined,
            };

            match joined {
                None => break,
                Some(Ok((profile, Ok(value)))) => {
                    losers.cancel();
                    // Dropping the set aborts whatever is still running.
                    drop(attempts);
                    info!(
                        database = %database,
                        profile = %profile,
                        losses = failures.len(),
                        "Race read won"
                    );
                    return Ok(ReadOutcome::won(value, profile, failures));
                }
                Some(Ok((profile, Err(error)))) => {
                    debug!(
                        database = %database,
                        profile = %profile,
                        %error,
                        "Race read attempt lost"
                    );
                    reported.insert(profile.clone());
                    failures.push(ProfileFailure { profile, error });
                }
                Some(Err(join_error)) => {
                    warn!(database = %database, error = %join_error, "Race read attempt aborted");
                }
            }
        }

        // Attempts that died without reporting (panics) still count as losses.
        failures.extend(
            profiles
                .iter()
                .filter(|h| !reported.contains(h.name()))
                .map(|h| ProfileFailure {
                    profile: h.name().to_string(),
                    error: AttemptError::Aborted(
                        "attempt task ended without reporting".to_string(),
                    ),
                }),
        );

        let outcome = ReadOutcome::lost(failures);
        warn!(
            database = %database,
            detail = outcome.error_detail.as_deref().unwrap_or_default(),
            "Race read failed on every profile"
        );
        Ok(outcome)
    }
}
