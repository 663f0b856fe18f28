use taskdeck_core::config::SyncSettings;
use taskdeck_core::models::TaskPatch;

use crate::commands::common::{build_engine, open_database, resolve_task_reference};
use crate::error::CliError;

/// Translate edit flags into a patch. `--clear-description` maps to
/// the explicit-null form so the field is removed rather than kept.
pub fn edit_patch(
    title: Option<String>,
    description: Option<String>,
    clear_description: bool,
    reopen: bool,
) -> TaskPatch {
    let description = if clear_description {
        Some(None)
    } else {
        description.map(Some)
    };
    TaskPatch {
        title,
        description,
        completed: reopen.then_some(false),
    }
}

pub async fn run_edit(
    id: &str,
    title: Option<String>,
    description: Option<String>,
    clear_description: bool,
    reopen: bool,
    settings: &SyncSettings,
) -> Result<(), CliError> {
    let patch = edit_patch(title, description, clear_description, reopen);
    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;

    let tasks = engine.tasks().await?;
    let task_id = resolve_task_reference(tasks.iter().map(|task| &task.id), id)?;

    let task = engine.update_task(&task_id, patch).await?;
    println!("Updated: {} (v{})", task.title, task.version);
    Ok(())
}
