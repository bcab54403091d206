//! Delete command handler.

use std::path::Path;

use anyhow::Result;

use super::load_artifact;
use crate::bootstrap::CliContext;
use crate::presentation::{ensure_some_success, print_persist_report};

pub async fn execute(ctx: &CliContext, channel: &str, file: &Path) -> Result<()> {
    let artifact = load_artifact(ctx, channel, file).await?;
    let report = ctx.schedule().delete(channel, &artifact, ctx.cancel()).await?;
    print_persist_report("delete", &report);
    ensure_some_success("delete", report.status(), || report.summary())?;
    Ok(())
}
