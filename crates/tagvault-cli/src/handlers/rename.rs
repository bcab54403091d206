//! Rename command handler.

use std::path::Path;

use anyhow::Result;

use super::load_artifact;
use crate::bootstrap::CliContext;
use crate::presentation::{ensure_some_success, print_persist_report};

pub async fn execute(
    ctx: &CliContext,
    channel: &str,
    old_file: &Path,
    new_file: &Path,
) -> Result<()> {
    let previous = load_artifact(ctx, channel, old_file).await?;
    let next = load_artifact(ctx, channel, new_file).await?;
    let report = ctx
        .schedule()
        .rename(channel, &previous, &next, ctx.cancel())
        .await?;
    print_persist_report("rename", &report);
    ensure_some_success("rename", report.status(), || report.summary())?;
    Ok(())
}
