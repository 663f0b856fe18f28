use taskdeck_core::config::SyncSettings;
use taskdeck_core::models::TaskDraft;

use crate::commands::common::{build_engine, normalize_title, open_database};
use crate::error::CliError;

pub async fn run_add(
    title_parts: &[String],
    description: Option<String>,
    settings: &SyncSettings,
) -> Result<(), CliError> {
    let title = normalize_title(title_parts).ok_or(CliError::EmptyTitle)?;
    let draft = TaskDraft::new(title, description).map_err(CliError::Core)?;

    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;
    let task = engine.create_task(draft).await?;

    if task.id.is_local() {
        println!("{}  (queued for sync)", task.id);
    } else {
        println!("{}", task.id);
    }
    Ok(())
}
