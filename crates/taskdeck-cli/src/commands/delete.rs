use taskdeck_core::config::SyncSettings;

use crate::commands::common::{build_engine, open_database, resolve_task_reference};
use crate::error::CliError;

pub async fn run_delete(id: &str, settings: &SyncSettings) -> Result<(), CliError> {
    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;

    let tasks = engine.tasks().await?;
    let task_id = resolve_task_reference(tasks.iter().map(|task| &task.id), id)?;

    engine.delete_task(&task_id).await?;
    println!("Deleted {task_id}");
    Ok(())
}
