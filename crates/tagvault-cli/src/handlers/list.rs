//! List command handler.
//!
//! Displays every playlist stored on the channel's first reachable target.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, channel: &str) -> Result<()> {
    let listing = ctx.schedule().list(channel, ctx.cancel()).await?;

    println!("Reading from {}", listing.source.root().display());
    if listing.artifacts.is_empty() && listing.failures.is_empty() {
        println!("No playlists stored for {channel}.");
        return Ok(());
    }

    println!("{:<12} {:<6} {:<28} {:>5} {:>9}", "Date", "Time", "Title", "Cuts", "Length");
    print_separator(64);
    for (_, artifact) in &listing.artifacts {
        let secs = artifact.total_duration().as_secs();
        println!(
            "{:<12} {:<6} {:<28} {:>5} {:>6}:{:02}",
            artifact.scheduled_date().format("%Y-%m-%d"),
            artifact.scheduled_time().format("%H:%M"),
            truncate_string(artifact.title(), 27),
            artifact.cuts().len(),
            secs / 60,
            secs % 60
        );
    }

    if !listing.failures.is_empty() {
        println!();
        println!("{} file(s) could not be read:", listing.failures.len());
        for (path, error) in &listing.failures {
            println!("  {}: {error}", path.display());
        }
    }
    Ok(())
}
