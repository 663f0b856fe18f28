//! HTTP client for the remote task service

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::models::{SyncOperation, Task, TaskDraft, TaskId, TaskPatch};

use super::{RemoteError, RemoteResult, RemoteTaskService, SyncReport};

/// reqwest-backed [`RemoteTaskService`] speaking the task backend's
/// JSON API with bearer-token authentication.
#[derive(Clone)]
pub struct HttpRemoteClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpRemoteClient {
    /// Build a client for the given endpoint.
    ///
    /// The endpoint must include an http/https scheme; a trailing
    /// slash is stripped.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> RemoteResult<Self> {
        let base_url = normalize_endpoint(endpoint.into())?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|error| RemoteError::Network(error.to_string()))?;
        Ok(Self {
            base_url,
            token: token.into(),
            client,
        })
    }

    /// Cheap reachability probe against the health endpoint
    pub async fn ping(&self) -> RemoteResult<()> {
        let response = self
            .client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await
            .map_err(request_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::Api(format!(
                "health check returned HTTP {}",
                response.status().as_u16()
            )))
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> RemoteResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|error| RemoteError::Api(format!("invalid response payload: {error}")));
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_api_error(status, &body);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                RemoteError::Validation(message)
            }
            _ => RemoteError::Api(message),
        })
    }
}

impl RemoteTaskService for HttpRemoteClient {
    async fn list(&self) -> RemoteResult<Vec<Task>> {
        let response = self
            .client
            .get(self.url("/tasks"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(request_error)?;
        Self::decode(response).await
    }

    async fn create(&self, draft: &TaskDraft, client_id: &TaskId) -> RemoteResult<Task> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .bearer_auth(&self.token)
            .json(&json!({
                "title": draft.title,
                "description": draft.description,
                "clientId": client_id,
            }))
            .send()
            .await
            .map_err(request_error)?;
        Self::decode(response).await
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> RemoteResult<Task> {
        let response = self
            .client
            .put(self.url(&format!("/tasks/{id}")))
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await
            .map_err(request_error)?;
        Self::decode(response).await
    }

    async fn delete(&self, id: &TaskId) -> RemoteResult<TaskId> {
        #[derive(Deserialize)]
        struct Deleted {
            id: TaskId,
        }

        let response = self
            .client
            .delete(self.url(&format!("/tasks/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(request_error)?;
        let deleted: Deleted = Self::decode(response).await?;
        Ok(deleted.id)
    }

    async fn sync_operations(&self, operations: &[SyncOperation]) -> RemoteResult<SyncReport> {
        let response = self
            .client
            .post(self.url("/sync"))
            .bearer_auth(&self.token)
            .json(&json!({ "operations": operations }))
            .send()
            .await
            .map_err(request_error)?;
        Self::decode(response).await
    }
}

fn request_error(error: reqwest::Error) -> RemoteError {
    RemoteError::Network(error.to_string())
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> RemoteResult<String> {
    let endpoint = raw.trim();
    if endpoint.is_empty() {
        return Err(RemoteError::Validation(
            "endpoint must not be empty".to_string(),
        ));
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::Validation(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}
