//! Filesystem-backed target probe.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::Target;
use crate::ports::TargetProbe;

/// Treats a target as accessible when its root is an existing directory.
///
/// A dropped network mount either errors or hangs on `metadata`; the
/// replicator bounds the call with its attempt timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTargetProbe;

#[async_trait]
impl TargetProbe for FsTargetProbe {
    async fn is_accessible(&self, target: &Target) -> bool {
        match tokio::fs::metadata(target.root()).await {
            Ok(meta) => meta.is_dir(),
            Err(e) => {
                debug!(target = %target, error = %e, "Target not accessible");
                false
            }
        }
    }
}
