//! Target reachability port.

use async_trait::async_trait;

use crate::domain::Target;

/// Decides whether a target root is reachable right now.
///
/// Results are never cached by callers: a share can drop or return between
/// two operations on the same channel.
#[async_trait]
pub trait TargetProbe: Send + Sync {
    async fn is_accessible(&self, target: &Target) -> bool;
}
