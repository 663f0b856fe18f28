use taskdeck_core::config::SyncSettings;

use crate::commands::common::{build_engine, open_database};
use crate::error::CliError;

pub async fn run_sync(settings: &SyncSettings) -> Result<(), CliError> {
    if !settings.is_remote_configured() {
        return Err(CliError::SyncNotConfigured);
    }

    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;

    if !engine.connectivity().is_online() {
        println!("Remote service unreachable; queued changes will sync later.");
        return Ok(());
    }

    let outcome = engine.sync_now().await?;
    println!(
        "Synced {} operation(s), {} conflict(s).",
        outcome.synced, outcome.conflicts
    );
    if outcome.conflicts > 0 {
        println!("Run `taskdeck conflicts` to review them.");
    }
    Ok(())
}
