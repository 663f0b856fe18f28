use taskdeck_core::config::SyncSettings;
use taskdeck_core::SyncState;

use crate::commands::common::{build_engine, open_database};
use crate::error::CliError;

pub async fn run_status(as_json: bool, settings: &SyncSettings) -> Result<(), CliError> {
    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;
    let status = engine.status().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let label = match status.state {
        SyncState::Offline => "offline",
        SyncState::Syncing => "syncing",
        SyncState::Synced => "synced",
        SyncState::Error => "sync pending",
    };
    println!("State: {label}");
    println!("Pending operations: {}", status.pending_operations);
    println!("Unresolved conflicts: {}", status.conflicts);
    Ok(())
}
