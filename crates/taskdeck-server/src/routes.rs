use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use taskdeck_core::models::{SyncOperation, Task, TaskDraft, TaskId, TaskPatch};
use taskdeck_core::remote::SyncReport;

use crate::auth::{extract_bearer_token, AuthenticatedUser};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::state::TaskVault;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    vault: Arc<RwLock<TaskVault>>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            vault: Arc::new(RwLock::new(TaskVault::default())),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        .route("/sync", post(sync_batch))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;
    if token != state.config.api_token {
        return Err(AppError::unauthorized("Invalid bearer token"));
    }
    request.extensions_mut().insert(AuthenticatedUser {
        user_id: state.config.user_id.clone(),
    });
    Ok(next.run(request).await)
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let vault = state.vault.read().await;
    Json(vault.list())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    title: String,
    #[serde(default)]
    description: Option<String>,
    /// Temporary client id, used to deduplicate replayed creates
    #[serde(default)]
    client_id: Option<TaskId>,
}

async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let draft = TaskDraft::new(request.title, request.description)
        .map_err(|error| AppError::bad_request(error.to_string()))?;

    let mut vault = state.vault.write().await;
    let task = vault.create(
        &draft.title,
        draft.description,
        request.client_id.as_ref(),
        &user.user_id,
    );
    tracing::info!(task_id = %task.id, "Created task");
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, AppError> {
    patch
        .validate()
        .map_err(|error| AppError::bad_request(error.to_string()))?;

    let id = TaskId::from(id);
    let mut vault = state.vault.write().await;
    let task = vault
        .update(&id, &patch)
        .ok_or_else(|| AppError::not_found(format!("no task with id {id}")))?;
    tracing::info!(task_id = %task.id, version = task.version, "Updated task");
    Ok(Json(task))
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    id: TaskId,
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    let id = TaskId::from(id);
    let mut vault = state.vault.write().await;
    if !vault.delete(&id) {
        return Err(AppError::not_found(format!("no task with id {id}")));
    }
    tracing::info!(task_id = %id, "Deleted task");
    Ok(Json(DeletedResponse { id }))
}

#[derive(Debug, Deserialize)]
struct SyncRequest {
    operations: Vec<SyncOperation>,
}

async fn sync_batch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncReport>, AppError> {
    let mut vault = state.vault.write().await;
    let report = vault.apply_operations(&request.operations, &user.user_id);
    tracing::info!(
        received = request.operations.len(),
        synced = report.synced,
        conflicts = report.conflicts.len(),
        "Applied sync batch"
    );
    Ok(Json(report))
}
