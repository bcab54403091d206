//! Channels command handler.

use anyhow::Result;
use serde_json::json;
use tagvault_core::Channel;

use crate::bootstrap::CliContext;
use crate::presentation::{print_separator, truncate_string};

/// List catalog channels with how many of their targets are reachable now.
pub async fn execute(ctx: &CliContext, refresh: bool, usable: bool, json: bool) -> Result<()> {
    let all = ctx.catalog().get(refresh, ctx.cancel()).await;
    let channels: Vec<Channel> = if usable {
        ctx.catalog().get_usable_only()
    } else {
        all.to_vec()
    };

    let mut rows = Vec::with_capacity(channels.len());
    for channel in channels {
        let accessible = ctx
            .coordinator()
            .files()
            .accessible_targets(&channel)
            .await
            .len();
        rows.push((channel, accessible));
    }

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(channel, accessible)| {
                json!({
                    "name": channel.name,
                    "targets": channel.targets,
                    "accessible_targets": accessible,
                    "from_config": channel.is_from_config,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No channels found.");
        return Ok(());
    }

    println!("{:<20} {:<10} {:<8} Primary target", "Channel", "Reachable", "Source");
    print_separator(72);
    for (channel, accessible) in &rows {
        let primary = channel
            .primary_target()
            .map_or_else(|| "--".to_string(), |t| t.root().display().to_string());
        println!(
            "{:<20} {:<10} {:<8} {}",
            truncate_string(&channel.name, 19),
            format!("{accessible}/{}", channel.targets.len()),
            if channel.is_from_config { "config" } else { "catalog" },
            primary
        );
    }
    Ok(())
}
