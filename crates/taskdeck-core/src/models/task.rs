//! Task model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Prefix for client-generated ids that have not yet been assigned a
/// server identity.
const LOCAL_ID_PREFIX: &str = "local-";

/// A task identifier: either an opaque server-assigned id or a
/// temporary client-generated id pending first sync.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a temporary client-side id using UUID v7 (time-sortable)
    #[must_use]
    pub fn local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Whether this id is still a client-side temporary id
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    /// Get the string representation of this id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A task in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Short title, always non-empty
    pub title: String,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Completion flag
    pub completed: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
    /// Owner reference
    pub user_id: String,
    /// Monotonically increasing mutation counter, starts at 1.
    /// This is the sole conflict-detection signal.
    pub version: i64,
}

impl Task {
    /// Create a task locally with a temporary id and `version = 1`
    #[must_use]
    pub fn new_local(draft: &TaskDraft, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::local(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            completed: false,
            created_at: now,
            updated_at: now,
            user_id: user_id.to_string(),
            version: 1,
        }
    }

    /// Merge a partial update into this task, bumping `version` and
    /// `updated_at`. Fields left as `None` are untouched.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = Utc::now();
        self.version += 1;
    }

    /// The full-record patch used when forcing local state onto the server
    #[must_use]
    pub fn as_patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            completed: Some(self.completed),
        }
    }
}

/// Payload for creating a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Task title, required non-empty
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskDraft {
    /// Create a draft from a raw title, rejecting empty titles
    pub fn new(title: impl Into<String>, description: Option<String>) -> Result<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidInput("task title must not be empty".into()));
        }
        Ok(Self { title, description })
    }
}

/// Partial task update with each field independently optional.
///
/// An explicit struct rather than an untyped map, so the merge into
/// the local record has a single auditable contract. `description` is
/// doubly optional: an absent field leaves it untouched, an explicit
/// `null` on the wire (`Some(None)`) clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Keeps `null` distinct from an absent field: serde only invokes
/// this when the key is present, so `null` becomes `Some(None)`.
fn deserialize_nullable<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    /// Whether this patch carries no changes at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    /// Validate patch contents (a provided title must be non-empty)
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(Error::InvalidInput("task title must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft::new(title, None).unwrap()
    }

    #[test]
    fn test_local_id_is_flagged() {
        let id = TaskId::local();
        assert!(id.is_local());
        assert!(!TaskId::from("srv-42").is_local());
    }

    #[test]
    fn test_local_ids_unique() {
        assert_ne!(TaskId::local(), TaskId::local());
    }

    #[test]
    fn test_new_local_task() {
        let task = Task::new_local(&draft("Buy milk"), "u1");
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.version, 1);
        assert!(task.id.is_local());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_draft_rejects_empty_title() {
        assert!(TaskDraft::new("   ", None).is_err());
        assert!(TaskDraft::new("ok", None).is_ok());
    }

    #[test]
    fn test_apply_merges_and_bumps_version() {
        let mut task = Task::new_local(&draft("Original"), "u1");
        task.apply(&TaskPatch {
            title: None,
            description: Some(Some("details".to_string())),
            completed: Some(true),
        });

        assert_eq!(task.title, "Original");
        assert_eq!(task.description.as_deref(), Some("details"));
        assert!(task.completed);
        assert_eq!(task.version, 2);
    }

    #[test]
    fn test_apply_clears_description_on_explicit_null() {
        let mut task = Task::new_local(
            &TaskDraft::new("Documented", Some("obsolete".to_string())).unwrap(),
            "u1",
        );
        task.apply(&TaskPatch {
            description: Some(None),
            ..TaskPatch::default()
        });
        assert_eq!(task.description, None);

        // An absent field leaves the description untouched
        task.description = Some("kept".to_string());
        task.apply(&TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        });
        assert_eq!(task.description.as_deref(), Some("kept"));
    }

    #[test]
    fn test_patch_wire_null_clears_absent_leaves() {
        let clearing: TaskPatch = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(clearing.description, Some(None));
        assert_eq!(serde_json::to_string(&clearing).unwrap(), r#"{"description":null}"#);

        let untouched: TaskPatch = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(untouched.description, None);

        let setting: TaskPatch = serde_json::from_str(r#"{"description":"added"}"#).unwrap();
        assert_eq!(setting.description, Some(Some("added".to_string())));
    }

    #[test]
    fn test_patch_validation() {
        let patch = TaskPatch {
            title: Some("  ".to_string()),
            ..TaskPatch::default()
        };
        assert!(patch.validate().is_err());
        assert!(TaskPatch::default().validate().is_ok());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let task = Task::new_local(&draft("Call dentist"), "u1");
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
        assert!(json.contains("\"userId\""));
    }
}
