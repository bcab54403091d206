//! Init-schema command handler.
//!
//! Creates each replica database file if missing and applies the schema.
//! Replicas are initialized one at a time; an unreachable replica is
//! reported and the rest continue.

use anyhow::Result;
use tagvault_db::initialize_replica;
use tracing::warn;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let mut initialized = 0usize;
    let mut failed = 0usize;

    for (database, profiles) in &ctx.config().databases {
        println!("{database}:");
        for profile in profiles {
            match initialize_replica(profile).await {
                Ok(pool) => {
                    pool.close().await;
                    initialized += 1;
                    println!("  ✓ {}", profile.name);
                }
                Err(e) => {
                    failed += 1;
                    warn!(profile = %profile.name, error = %e, "Replica initialization failed");
                    println!("  ✗ {}: {e:#}", profile.name);
                }
            }
        }
    }

    println!("Initialized {initialized} replica(s), {failed} failed");
    if initialized == 0 && failed > 0 {
        return Err(CliError::Unavailable("no replica could be initialized".to_string()).into());
    }
    Ok(())
}
