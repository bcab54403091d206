//! Repair command handler.

use std::path::Path;

use anyhow::Result;
use tagvault_core::OutcomeStatus;

use super::load_artifact;
use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::print_repair_outcome;

/// Copy a saved playlist onto reachable targets that lack it.
///
/// Fails only when no target holds or received a copy.
pub async fn execute(ctx: &CliContext, channel: &str, file: &Path) -> Result<()> {
    let artifact = load_artifact(ctx, channel, file).await?;
    let outcome = ctx.schedule().repair(channel, &artifact, ctx.cancel()).await?;
    print_repair_outcome(&outcome);

    if outcome.already_present.is_empty() && outcome.files.status() == OutcomeStatus::TotalFailure {
        return Err(CliError::Unavailable(format!(
            "repair: {}",
            outcome.files.error_detail().unwrap_or_default()
        ))
        .into());
    }
    Ok(())
}
