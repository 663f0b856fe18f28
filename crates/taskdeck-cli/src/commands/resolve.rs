use taskdeck_core::config::SyncSettings;

use crate::cli::KeepSide;
use crate::commands::common::{build_engine, open_database, resolve_task_reference};
use crate::error::CliError;

pub async fn run_resolve(id: &str, keep: KeepSide, settings: &SyncSettings) -> Result<(), CliError> {
    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;

    let conflicts = engine.conflicts().await?;
    let task_id = resolve_task_reference(conflicts.iter().map(|conflict| &conflict.task_id), id)?;

    let task = engine
        .resolve_conflict(&task_id, keep == KeepSide::Local)
        .await?;
    println!("Resolved: kept \"{}\" (v{})", task.title, task.version);
    Ok(())
}
