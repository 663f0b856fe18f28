//! Runtime configuration for sync-capable clients.

use std::path::PathBuf;

/// Environment variable naming the remote API endpoint
pub const ENV_API_URL: &str = "TASKDECK_API_URL";
/// Environment variable holding the bearer token
pub const ENV_API_TOKEN: &str = "TASKDECK_API_TOKEN";
/// Environment variable naming the local owner id
pub const ENV_USER_ID: &str = "TASKDECK_USER_ID";

/// Settings needed to wire up a sync engine.
///
/// Endpoint and token are optional: without them the client runs in
/// local-only mode and every mutation lands in the outbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSettings {
    /// Remote task service endpoint (e.g. `https://api.example.com`)
    pub endpoint: Option<String>,
    /// Bearer token for the remote task service
    pub token: Option<String>,
    /// Owner id stamped onto locally-created tasks
    pub user_id: String,
    /// Local database location
    pub db_path: PathBuf,
}

impl SyncSettings {
    /// Read settings from the environment, with the given fallback
    /// database path.
    #[must_use]
    pub fn from_env(default_db_path: PathBuf) -> Self {
        Self {
            endpoint: normalize_text_option(std::env::var(ENV_API_URL).ok()),
            token: normalize_text_option(std::env::var(ENV_API_TOKEN).ok()),
            user_id: normalize_text_option(std::env::var(ENV_USER_ID).ok())
                .unwrap_or_else(|| "local".to_string()),
            db_path: default_db_path,
        }
    }

    /// Whether a remote endpoint is configured
    #[must_use]
    pub const fn is_remote_configured(&self) -> bool {
        self.endpoint.is_some() && self.token.is_some()
    }
}

/// Trim an optional string, mapping whitespace-only values to `None`
#[must_use]
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
