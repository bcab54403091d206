//! TTL-cached channel catalog.
//!
//! The channel list comes from the catalog database via a race read, merged
//! with statically configured targets. Snapshots are immutable and swapped
//! whole; readers holding an old `Arc` keep a consistent view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ChannelTargets;
use crate::coordination::ReadCoordinator;
use crate::domain::{Channel, LogicalDatabaseName, NoParams, RowCursor};
use crate::outcome::AttemptError;

/// Freshness of the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    /// Never loaded successfully. Configured channels may still be served.
    Empty,
    Fresh,
    /// Older than the TTL, or explicitly invalidated.
    Stale,
}

#[derive(Debug, Default)]
struct Snapshot {
    channels: Arc<[Channel]>,
    loaded_at: Option<Instant>,
    /// Invalidation generation observed when the load started.
    generation: u64,
}

#[derive(Debug)]
pub struct ChannelCatalog {
    reader: ReadCoordinator,
    database: LogicalDatabaseName,
    listing_sql: Arc<str>,
    configured: Vec<ChannelTargets>,
    ttl: Duration,
    snapshot: RwLock<Arc<Snapshot>>,
    generation: AtomicU64,
    refresh_lock: Mutex<()>,
}

impl ChannelCatalog {
    /// `listing_sql` must return one channel name per row in the first
    /// column.
    pub fn new(
        reader: ReadCoordinator,
        database: LogicalDatabaseName,
        listing_sql: impl Into<Arc<str>>,
        configured: Vec<ChannelTargets>,
        ttl: Duration,
    ) -> Self {
        Self {
            reader,
            database,
            listing_sql: listing_sql.into(),
            configured,
            ttl,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            generation: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
        }
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn swap(&self, snapshot: Snapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }

    pub fn state(&self) -> CatalogState {
        let snapshot = self.current();
        match snapshot.loaded_at {
            None => CatalogState::Empty,
            Some(_) if snapshot.generation != self.generation.load(Ordering::Acquire) => {
                CatalogState::Stale
            }
            Some(at) if at.elapsed() >= self.ttl => CatalogState::Stale,
            Some(_) => CatalogState::Fresh,
        }
    }

    /// Cached channels when fresh and not forced; otherwise refresh.
    ///
    /// Callers that queue behind an in-flight refresh reuse its result.
    pub async fn get(&self, force: bool, cancel: &CancellationToken) -> Arc<[Channel]> {
        if !force && self.state() == CatalogState::Fresh {
            debug!("Channel catalog served from cache");
            return Arc::clone(&self.current().channels);
        }
        let _guard = self.refresh_lock.lock().await;
        if !force && self.state() == CatalogState::Fresh {
            debug!("Channel catalog refreshed by a concurrent caller");
            return Arc::clone(&self.current().channels);
        }
        self.reload(cancel).await
    }

    /// Reload from the catalog database.
    ///
    /// On failure the previous snapshot is returned unchanged and stays
    /// stale, so the next `get` retries. If the catalog never loaded, the
    /// configured channels are served meanwhile.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Arc<[Channel]> {
        let _guard = self.refresh_lock.lock().await;
        self.reload(cancel).await
    }

    /// Caller holds `refresh_lock`.
    async fn reload(&self, cancel: &CancellationToken) -> Arc<[Channel]> {
        let generation = self.generation.load(Ordering::Acquire);
        let outcome = self
            .reader
            .race_read(&self.database, &self.listing_sql, &NoParams, map_names, cancel)
            .await;

        let names = match outcome {
            Ok(read) if read.succeeded() => read.into_value().unwrap_or_default(),
            // Every profile answered, just with no channel rows.
            Ok(read)
                if !read.failures.is_empty()
                    && read
                        .failures
                        .iter()
                        .all(|f| f.error == AttemptError::EmptyResult) =>
            {
                Vec::new()
            }
            Ok(read) => {
                let detail = read.error_detail.unwrap_or_default();
                return self.keep_previous(&detail);
            }
            Err(e) => return self.keep_previous(&e.to_string()),
        };

        let channels: Arc<[Channel]> = merge(names, &self.configured).into();
        let from_config = channels.iter().filter(|c| c.is_from_config).count();
        self.swap(Snapshot {
            channels: Arc::clone(&channels),
            loaded_at: Some(Instant::now()),
            generation,
        });

        info!(
            database = %self.database,
            channels = channels.len(),
            from_config,
            "Loaded channel catalog"
        );
        channels
    }

    fn keep_previous(&self, detail: &str) -> Arc<[Channel]> {
        let previous = self.current();
        if previous.loaded_at.is_some() {
            warn!(
                database = %self.database,
                detail,
                cached = previous.channels.len(),
                "Channel refresh failed; serving cached catalog"
            );
            return Arc::clone(&previous.channels);
        }

        let channels: Arc<[Channel]> = merge(Vec::new(), &self.configured).into();
        warn!(
            database = %self.database,
            detail,
            configured = channels.len(),
            "Channel catalog unavailable; serving configured channels"
        );
        self.swap(Snapshot {
            channels: Arc::clone(&channels),
            loaded_at: None,
            generation: previous.generation,
        });
        channels
    }

    /// Make the next `get` refresh. The snapshot stays readable.
    ///
    /// A refresh already in flight does not count as fresh afterwards.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        debug!("Channel catalog invalidated");
    }

    /// Look up a channel in the current snapshot without refreshing.
    pub fn get_by_name(&self, name: &str) -> Option<Channel> {
        self.current()
            .channels
            .iter()
            .find(|c| c.name_matches(name))
            .cloned()
    }

    /// Channels in the current snapshot with at least one target.
    pub fn get_usable_only(&self) -> Vec<Channel> {
        self.current()
            .channels
            .iter()
            .filter(|c| c.is_usable())
            .cloned()
            .collect()
    }
}

fn map_names(cursor: RowCursor) -> Result<Vec<String>, String> {
    cursor
        .into_iter()
        .map(|row| {
            row.get_index(0)
                .and_then(|value| value.as_str())
                .map(str::to_string)
                .ok_or_else(|| "channel name column is missing or not text".to_string())
        })
        .collect()
}

/// Database channels first, in listing order, each carrying its configured
/// targets; then configured channels the database does not know.
fn merge(names: Vec<String>, configured: &[ChannelTargets]) -> Vec<Channel> {
    let mut channels: Vec<Channel> = Vec::with_capacity(names.len() + configured.len());
    for name in names {
        if channels.iter().any(|c| c.name_matches(&name)) {
            continue;
        }
        let targets = configured
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&name))
            .map(ChannelTargets::to_targets)
            .unwrap_or_default();
        channels.push(Channel::new(name, targets));
    }
    for entry in configured {
        if !channels.iter().any(|c| c.name_matches(&entry.name)) {
            channels.push(Channel::from_config(entry.name.clone(), entry.to_targets()));
        }
    }
    channels
}
