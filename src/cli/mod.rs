//! Command-line interface for command-center
//!
//! This module defines the CLI structure using clap derive macros.
//! With no subcommand the HTTP server starts; the other subcommands work
//! directly on the data directory, so they are usable with the server down.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::api::AppState;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::Result;
use crate::ids::RandomIds;
use crate::storage::Storage;

mod activity;
mod events;
mod serve;
mod tasks;

/// command-center - local dashboard backend
///
/// Records tasks, keeps an append-only event log and surfaces the tail of
/// an external process's log as activity.
#[derive(Parser, Debug)]
#[command(name = "command-center")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding tasks.json and events.jsonl
    #[arg(long, global = true, env = "COMMAND_CENTER_DATA", default_value = "data")]
    pub data_dir: PathBuf,

    /// Configuration file (defaults to <data-dir>/command-center.toml)
    #[arg(long, global = true, env = "COMMAND_CENTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen host
    #[arg(long, global = true, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, global = true, env = "PORT", default_value_t = 3999)]
    pub port: u16,

    /// Static web front end served outside /api
    #[arg(long, global = true, env = "COMMAND_CENTER_WEB", default_value = "web")]
    pub web_dir: PathBuf,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Task management
    #[command(subcommand)]
    Tasks(TaskCommands),

    /// Event log access
    #[command(subcommand)]
    Events(EventCommands),

    /// Show activity lines from the newest external log
    Activity {
        /// Maximum number of lines
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the raw tail of the newest external log
    Logs {
        /// Number of lines (10-5000)
        #[arg(long, default_value_t = crate::activity::DEFAULT_LOG_LINES)]
        lines: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks, newest first
    List,

    /// Create a task or update the task with the given id
    Upsert {
        /// Task title
        #[arg(long)]
        title: String,

        /// Existing task id to update
        #[arg(long)]
        id: Option<String>,

        /// New status
        #[arg(long)]
        status: Option<String>,

        /// Free-text detail
        #[arg(long)]
        detail: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// Print the most recent events
    Tail {
        /// Number of events (10-2000)
        #[arg(long, default_value_t = crate::events::DEFAULT_TAIL_LIMIT)]
        limit: usize,
    },

    /// Append an event
    Append {
        /// Event type, e.g. "deploy.finished"
        #[arg(long = "type")]
        kind: String,

        /// JSON detail payload
        #[arg(long)]
        detail: Option<String>,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let storage = Storage::new(&self.data_dir);
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| storage.config_file());
        let config = Config::load_or_default(&config_path);
        let state = AppState::new(
            storage.clone(),
            &config,
            Arc::new(SystemClock),
            Arc::new(RandomIds),
        )?;

        match self.command {
            None | Some(Commands::Serve) => {
                storage.init()?;
                serve::run(state, self.host, self.port, self.web_dir)
            }
            Some(Commands::Tasks(command)) => tasks::run(&state, command, self.json),
            Some(Commands::Events(command)) => events::run(&state, command, self.json),
            Some(Commands::Activity { limit }) => activity::run_activity(&state, limit, self.json),
            Some(Commands::Logs { lines }) => activity::run_logs(&state, lines, self.json),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
