use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use taskdeck_core::config::SyncSettings;
use taskdeck_core::db::{Database, LibSqlTaskStore};
use taskdeck_core::models::{SyncConflict, Task, TaskId};
use taskdeck_core::remote::HttpRemoteClient;
use taskdeck_core::{ConnectivityMonitor, SyncEngine};

use crate::error::CliError;

pub type CliEngine<'a> = SyncEngine<HttpRemoteClient, LibSqlTaskStore<'a>>;

/// Placeholder endpoint for local-only mode; the connectivity monitor
/// starts offline, so this address is never contacted.
const LOCAL_ONLY_ENDPOINT: &str = "http://127.0.0.1:0";

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("TASKDECK_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| panic!("Failed to resolve CLI data directory"))
        .join("taskdeck")
        .join("taskdeck.db")
}

pub async fn open_database(path: &Path) -> Result<Database, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Database::open(path)
        .await
        .map_err(|error| CliError::DatabaseInit(error.to_string()))
}

/// Wire up an engine over the local database. With a configured remote
/// the health endpoint decides the initial connectivity; otherwise the
/// engine runs local-only and every mutation lands in the outbox.
pub async fn build_engine<'a>(
    db: &'a Database,
    settings: &SyncSettings,
) -> Result<CliEngine<'a>, CliError> {
    let (client, online) = match (&settings.endpoint, &settings.token) {
        (Some(endpoint), Some(token)) => {
            let client = HttpRemoteClient::new(endpoint.clone(), token.clone())?;
            let online = client.ping().await.is_ok();
            (client, online)
        }
        _ => (HttpRemoteClient::new(LOCAL_ONLY_ENDPOINT, "")?, false),
    };

    Ok(SyncEngine::new(
        LibSqlTaskStore::new(db.connection()),
        client,
        ConnectivityMonitor::new(online),
        settings.user_id.clone(),
    ))
}

#[derive(Debug, Serialize)]
pub struct TaskListItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub version: i64,
    pub pending_sync: bool,
    pub updated_at: String,
    pub relative_time: String,
}

pub fn task_to_list_item(task: &Task) -> TaskListItem {
    TaskListItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        completed: task.completed,
        version: task.version,
        pending_sync: task.id.is_local(),
        updated_at: task.updated_at.to_rfc3339(),
        relative_time: format_relative_time(task.updated_at, Utc::now()),
    }
}

pub fn format_task_lines(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .map(|task| {
            let checkbox = if task.completed { "[x]" } else { "[ ]" };
            let pending = if task.id.is_local() { " (pending sync)" } else { "" };
            format!(
                "{checkbox} {}  {}{pending}  ({})",
                short_id(&task.id),
                task.title,
                format_relative_time(task.updated_at, Utc::now()),
            )
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ConflictItem {
    pub task_id: String,
    pub local_title: String,
    pub local_version: i64,
    pub remote_title: String,
    pub remote_version: i64,
    pub detected_at: String,
}

pub fn conflict_to_item(conflict: &SyncConflict) -> ConflictItem {
    ConflictItem {
        task_id: conflict.task_id.to_string(),
        local_title: conflict.local.title.clone(),
        local_version: conflict.local.version,
        remote_title: conflict.remote.title.clone(),
        remote_version: conflict.remote.version,
        detected_at: conflict.detected_at.to_rfc3339(),
    }
}

pub fn format_conflict_lines(conflicts: &[SyncConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  local \"{}\" (v{}) vs remote \"{}\" (v{})",
                short_id(&conflict.task_id),
                conflict.local.title,
                conflict.local.version,
                conflict.remote.title,
                conflict.remote.version,
            )
        })
        .collect()
}

/// Join argv words into a title, rejecting blank input
pub fn normalize_title(parts: &[String]) -> Option<String> {
    let joined = parts.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Resolve a raw id or unique prefix against a set of candidate ids
pub fn resolve_task_reference<'a>(
    candidates: impl IntoIterator<Item = &'a TaskId>,
    raw: &str,
) -> Result<TaskId, CliError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CliError::TaskNotFound(raw.to_string()));
    }

    let mut matches: Vec<&TaskId> = Vec::new();
    for id in candidates {
        if id.as_str() == raw {
            return Ok(id.clone());
        }
        if id.as_str().starts_with(raw) {
            matches.push(id);
        }
    }

    match matches.as_slice() {
        [] => Err(CliError::TaskNotFound(raw.to_string())),
        [only] => Ok((*only).clone()),
        many => Err(CliError::AmbiguousTaskId(format!(
            "Id prefix '{raw}' matches {} tasks; use a longer prefix",
            many.len()
        ))),
    }
}

/// First 8 characters of an id, enough to disambiguate in practice
pub fn short_id(id: &TaskId) -> &str {
    let raw = id.as_str();
    &raw[..raw.len().min(8)]
}

pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}
