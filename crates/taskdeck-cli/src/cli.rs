use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Manage tasks from the command line, online or offline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Quick capture: taskdeck "buy milk"
    #[arg(trailing_var_arg = true)]
    pub task: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new task
    #[command(alias = "new")]
    Add {
        /// Task title
        title: Vec<String>,
        /// Optional longer description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as completed
    Done {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Edit an existing task
    Edit {
        /// Task ID or unique ID prefix
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// Remove the description entirely
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        /// Reopen a completed task
        #[arg(long)]
        reopen: bool,
    },
    /// Delete an existing task
    Delete {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Drain the offline outbox against the remote service
    Sync,
    /// Show sync state, pending operations and conflicts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List unresolved sync conflicts
    Conflicts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a recorded sync conflict
    Resolve {
        /// Task ID or unique ID prefix
        id: String,
        /// Which version wins
        #[arg(long, value_enum)]
        keep: KeepSide,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KeepSide {
    /// Push the local version to the server
    Local,
    /// Accept the server version, discarding the local change
    Remote,
}
