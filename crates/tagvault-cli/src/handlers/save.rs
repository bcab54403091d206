//! Save command handler.

use std::path::Path;

use anyhow::Result;

use super::load_artifact;
use crate::bootstrap::CliContext;
use crate::presentation::{ensure_some_success, print_persist_report};

/// Save a local TAG file to every channel target and replica.
///
/// # Errors
///
/// Fails when the file cannot be parsed, the channel is unknown, or
/// neither a target nor a replica accepted the save.
pub async fn execute(ctx: &CliContext, channel: &str, file: &Path) -> Result<()> {
    let artifact = load_artifact(ctx, channel, file).await?;
    let report = ctx.schedule().save(channel, &artifact, ctx.cancel()).await?;
    print_persist_report("save", &report);
    ensure_some_success("save", report.status(), || report.summary())?;
    Ok(())
}
