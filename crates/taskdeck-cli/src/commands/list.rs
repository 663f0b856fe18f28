use taskdeck_core::config::SyncSettings;

use crate::commands::common::{
    build_engine, format_task_lines, open_database, task_to_list_item, TaskListItem,
};
use crate::error::CliError;

pub async fn run_list(all: bool, as_json: bool, settings: &SyncSettings) -> Result<(), CliError> {
    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;

    let mut tasks = engine.load_tasks().await?;
    if !all {
        tasks.retain(|task| !task.completed);
    }

    if as_json {
        let items = tasks
            .iter()
            .map(task_to_list_item)
            .collect::<Vec<TaskListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if tasks.is_empty() {
        println!("No tasks.");
    } else {
        for line in format_task_lines(&tasks) {
            println!("{line}");
        }
    }

    Ok(())
}
