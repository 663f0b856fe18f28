//! Reference implementation of the Taskdeck remote task service.
//!
//! Exposed as a library so integration tests can mount the router on
//! an ephemeral port and drive it with the real sync client.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use routes::{app_router, AppState};
