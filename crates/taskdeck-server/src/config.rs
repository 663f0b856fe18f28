use std::collections::HashMap;
use std::env;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Static bearer token; the full auth/session provider is an
    /// external collaborator and out of scope here.
    pub api_token: String,
    /// Owner id stamped onto tasks created through this instance
    pub user_id: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "TASKDECK_BIND_ADDR", "127.0.0.1:8080");
        let api_token = required_trimmed(&lookup, "TASKDECK_API_TOKEN")?;
        if api_token.len() < 8 {
            return Err(ConfigError::Invalid(
                "TASKDECK_API_TOKEN must be at least 8 characters".to_string(),
            ));
        }
        let user_id = value_or_default(&lookup, "TASKDECK_SERVER_USER", "local");

        Ok(Self {
            bind_addr,
            api_token,
            user_id,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn config_requires_api_token() {
        let map: HashMap<&str, &str> = HashMap::new();
        let err = AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("TASKDECK_API_TOKEN"));
    }

    #[test]
    fn config_redacts_token_in_debug() {
        let mut map = HashMap::new();
        map.insert("TASKDECK_API_TOKEN", "sensitive-token");

        let config =
            AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string())).unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-token"));
        assert!(debug_output.contains("[REDACTED]"));
        assert_eq!(config.user_id, "local");
    }

    #[test]
    fn config_rejects_short_token() {
        let mut map = HashMap::new();
        map.insert("TASKDECK_API_TOKEN", "short");
        assert!(
            AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string())).is_err()
        );
    }
}
