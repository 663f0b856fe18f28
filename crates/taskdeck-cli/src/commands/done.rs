use taskdeck_core::config::SyncSettings;
use taskdeck_core::models::TaskPatch;

use crate::commands::common::{build_engine, open_database, resolve_task_reference};
use crate::error::CliError;

pub async fn run_done(id: &str, settings: &SyncSettings) -> Result<(), CliError> {
    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;

    let tasks = engine.tasks().await?;
    let task_id = resolve_task_reference(tasks.iter().map(|task| &task.id), id)?;

    let patch = TaskPatch {
        completed: Some(true),
        ..TaskPatch::default()
    };
    let task = engine.update_task(&task_id, patch).await?;
    println!("Completed: {}", task.title);
    Ok(())
}
