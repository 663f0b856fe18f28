//! Local storage layer for Taskdeck

mod connection;
mod migrations;
mod task_store;

pub use connection::Database;
pub use task_store::{LibSqlTaskStore, TaskStore};
