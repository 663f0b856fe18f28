use taskdeck_core::config::SyncSettings;

use crate::commands::common::{
    build_engine, conflict_to_item, format_conflict_lines, open_database, ConflictItem,
};
use crate::error::CliError;

pub async fn run_conflicts(as_json: bool, settings: &SyncSettings) -> Result<(), CliError> {
    let db = open_database(&settings.db_path).await?;
    let engine = build_engine(&db, settings).await?;
    let conflicts = engine.conflicts().await?;

    if as_json {
        let items = conflicts
            .iter()
            .map(conflict_to_item)
            .collect::<Vec<ConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if conflicts.is_empty() {
        println!("No unresolved conflicts.");
    } else {
        for line in format_conflict_lines(&conflicts) {
            println!("{line}");
        }
        println!("Resolve with `taskdeck resolve <id> --keep local|remote`.");
    }

    Ok(())
}
