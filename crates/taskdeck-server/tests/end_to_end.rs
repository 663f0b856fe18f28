//! Full-stack tests: the real HTTP client and sync engine driving the
//! server over a loopback socket.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use taskdeck_core::connectivity::ConnectivityMonitor;
use taskdeck_core::db::{Database, LibSqlTaskStore};
use taskdeck_core::models::{TaskDraft, TaskPatch};
use taskdeck_core::remote::{HttpRemoteClient, RemoteTaskService};
use taskdeck_core::sync::SyncEngine;

use taskdeck_server::{app_router, AppConfig, AppState};

const TOKEN: &str = "test-token-1234";

async fn spawn_server() -> String {
    let config = Arc::new(AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: TOKEN.to_string(),
        user_id: "e2e".to_string(),
    });
    let router = app_router(AppState::from_config(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> HttpRemoteClient {
    HttpRemoteClient::new(base_url, TOKEN).unwrap()
}

fn engine<'a>(
    db: &'a Database,
    base_url: &str,
    online: bool,
) -> SyncEngine<HttpRemoteClient, LibSqlTaskStore<'a>> {
    SyncEngine::new(
        LibSqlTaskStore::new(db.connection()),
        client(base_url),
        ConnectivityMonitor::new(online),
        "e2e",
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn health_endpoint_is_open_tasks_are_not() {
    let base_url = spawn_server().await;

    client(&base_url).ping().await.unwrap();

    let bad = HttpRemoteClient::new(&base_url, "wrong-token-9999").unwrap();
    let error = bad.list().await.unwrap_err();
    assert!(!error.is_retryable());
    assert!(matches!(
        error,
        taskdeck_core::remote::RemoteError::Unauthorized(_)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn online_create_round_trips_server_identity() {
    let base_url = spawn_server().await;
    let db = Database::open_in_memory().await.unwrap();
    let engine = engine(&db, &base_url, true);

    let draft = TaskDraft::new("Write release notes", None).unwrap();
    let task = engine.create_task(draft).await.unwrap();
    assert!(!task.id.is_local());
    assert_eq!(task.version, 1);

    // A fresh engine pointed at the same server sees the task
    let other_db = Database::open_in_memory().await.unwrap();
    let other = engine_for(&other_db, &base_url);
    let tasks = other.load_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, task.id);
}

// Same as `engine` but starting online; separate helper keeps the
// borrow of the database local to each call site.
fn engine_for<'a>(
    db: &'a Database,
    base_url: &str,
) -> SyncEngine<HttpRemoteClient, LibSqlTaskStore<'a>> {
    engine(db, base_url, true)
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_outbox_drains_through_real_wire() {
    let base_url = spawn_server().await;
    let db = Database::open_in_memory().await.unwrap();
    let engine = engine(&db, &base_url, false);

    let task = engine
        .create_task(TaskDraft::new("Queued while offline", None).unwrap())
        .await
        .unwrap();
    assert!(task.id.is_local());
    engine
        .update_task(
            &task.id,
            TaskPatch {
                completed: Some(true),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();

    engine.connectivity().set_online(true);
    let outcome = engine.sync_now().await.unwrap();
    assert_eq!(outcome.synced, 2);
    assert_eq!(outcome.conflicts, 0);

    // Local cache now carries the server-assigned id, and the server
    // agrees on the final state.
    let tasks = engine.tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert!(!tasks[0].id.is_local());
    assert!(tasks[0].completed);

    let remote_tasks = client(&base_url).list().await.unwrap();
    assert_eq!(remote_tasks.len(), 1);
    assert_eq!(remote_tasks[0].id, tasks[0].id);
    assert!(remote_tasks[0].completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_edit_surfaces_conflict_and_resolves_local() {
    let base_url = spawn_server().await;

    // Device A creates the task online
    let db_a = Database::open_in_memory().await.unwrap();
    let engine_a = engine(&db_a, &base_url, true);
    let task = engine_a
        .create_task(TaskDraft::new("Shared task", None).unwrap())
        .await
        .unwrap();

    // Device B pulls it, then edits offline
    let db_b = Database::open_in_memory().await.unwrap();
    let engine_b = engine(&db_b, &base_url, true);
    engine_b.load_tasks().await.unwrap();
    engine_b.connectivity().set_online(false);
    engine_b
        .update_task(
            &task.id,
            TaskPatch {
                title: Some("Edited on B".to_string()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();

    // Meanwhile device A edits the same task online
    engine_a
        .update_task(
            &task.id,
            TaskPatch {
                title: Some("Edited on A".to_string()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();

    // B reconnects; its stale-versioned update must conflict
    engine_b.connectivity().set_online(true);
    let outcome = engine_b.sync_now().await.unwrap();
    assert_eq!(outcome.conflicts, 1);

    let conflicts = engine_b.conflicts().await.unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].local.title, "Edited on B");
    assert_eq!(conflicts[0].remote.title, "Edited on A");

    // Keeping local pushes B's record to the server
    let resolved = engine_b.resolve_conflict(&task.id, true).await.unwrap();
    assert_eq!(resolved.title, "Edited on B");

    let remote_tasks = client(&base_url).list().await.unwrap();
    assert_eq!(remote_tasks[0].title, "Edited on B");
    assert!(engine_b.conflicts().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_propagates_and_missing_target_is_not_found() {
    let base_url = spawn_server().await;
    let db = Database::open_in_memory().await.unwrap();
    let engine = engine(&db, &base_url, true);

    let task = engine
        .create_task(TaskDraft::new("Short-lived", None).unwrap())
        .await
        .unwrap();
    engine.delete_task(&task.id).await.unwrap();

    assert!(engine.tasks().await.unwrap().is_empty());
    assert!(client(&base_url).list().await.unwrap().is_empty());

    // Deleting again on the wire is a validation-side error, not retryable
    let error = client(&base_url).delete(&task.id).await.unwrap_err();
    assert!(!error.is_retryable());
}
