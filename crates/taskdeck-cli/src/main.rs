//! Taskdeck CLI - manage tasks from the terminal
//!
//! Works offline by default; mutations queue in a local outbox and
//! drain whenever the remote service is reachable.

mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};

use taskdeck_core::config::SyncSettings;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::conflicts::run_conflicts;
use crate::commands::delete::run_delete;
use crate::commands::done::run_done;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::resolve::run_resolve;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("taskdeck=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let settings = SyncSettings::from_env(resolve_db_path(cli.db_path));

    match cli.command {
        Some(Commands::Add { title, description }) => {
            run_add(&title, description, &settings).await?;
        }
        Some(Commands::List { all, json }) => run_list(all, json, &settings).await?,
        Some(Commands::Done { id }) => run_done(&id, &settings).await?,
        Some(Commands::Edit {
            id,
            title,
            description,
            clear_description,
            reopen,
        }) => run_edit(&id, title, description, clear_description, reopen, &settings).await?,
        Some(Commands::Delete { id }) => run_delete(&id, &settings).await?,
        Some(Commands::Sync) => run_sync(&settings).await?,
        Some(Commands::Status { json }) => run_status(json, &settings).await?,
        Some(Commands::Conflicts { json }) => run_conflicts(json, &settings).await?,
        Some(Commands::Resolve { id, keep }) => run_resolve(&id, keep, &settings).await?,
        None => {
            // Quick capture mode: taskdeck "buy milk"
            if cli.task.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                run_add(&cli.task, None, &settings).await?;
            }
        }
    }

    Ok(())
}
