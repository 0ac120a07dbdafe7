use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{FlowCommands, PlaybookCommands, StepCommands, WatchArgs};

/// Track incident-response playbook flows from the terminal
///
/// irflow instantiates playbooks against incidents and walks analysts through
/// their steps. Flows are stored in a local SQLite database, or on a remote
/// console when `--server` is given. Running `irf` without a command shows
/// the dashboard of flows in flight.
#[derive(Parser)]
#[command(version, about, name = "irf")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/irflow/irflow.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Base URL of a remote console; flows are stored there instead of locally
    #[arg(long, global = true, env = "IRFLOW_SERVER")]
    pub server: Option<String>,

    /// Bearer token for the remote console and its live feed
    #[arg(long, global = true, env = "IRFLOW_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Analyst name recorded on triggered flows and approvals. Defaults to $USER
    #[arg(long, global = true, env = "IRFLOW_ANALYST")]
    pub analyst: Option<String>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage the playbook catalogue
    #[command(alias = "pb")]
    Playbook {
        #[command(subcommand)]
        command: PlaybookCommands,
    },
    /// Trigger, inspect and control flows
    #[command(alias = "f")]
    Flow {
        #[command(subcommand)]
        command: FlowCommands,
    },
    /// Move a step of a flow through its lifecycle
    #[command(alias = "s")]
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Follow live updates from the remote console
    Watch(WatchArgs),
    /// Start the MCP server
    Serve,
}
