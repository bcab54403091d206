//! Command handlers.
//!
//! Each handler takes the composed `CliContext`, calls one core operation,
//! and prints the outcome. Total failures surface as `CliError::Unavailable`.

pub mod channels;
pub mod delete;
pub mod init_schema;
pub mod list;
pub mod rename;
pub mod repair;
pub mod save;
pub mod slot;

use std::path::Path;

use tagvault_core::PlaylistArtifact;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Read and parse a local TAG file for `channel`.
///
/// Legacy drive-letter audio paths are rewritten against the channel's
/// primary target.
pub(crate) async fn load_artifact(
    ctx: &CliContext,
    channel: &str,
    path: &Path,
) -> Result<PlaylistArtifact, CliError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    let channel = ctx.schedule().channel(channel, ctx.cancel()).await?;
    PlaylistArtifact::parse(&content, channel.primary_target())
        .map_err(|e| CliError::Arguments(format!("{}: {e}", path.display())))
}
