//! irflow CLI application
//!
//! Command-line interface for tracking incident-response playbook flows,
//! plus an MCP server exposing the same operations over stdio.

mod args;
mod cli;
mod commands;
mod mcp;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use commands::Cli;
use irflow_core::TrackerBuilder;
use log::info;
use mcp::{run_stdio_server, IrflowMcpServer};
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        server,
        token,
        analyst,
        no_color,
        command,
    } = Args::parse();

    let tracker = TrackerBuilder::new()
        .with_database_path(database_file)
        .with_remote(server.clone())
        .with_token(token.clone())
        .build()
        .await
        .context("Failed to initialize tracker")?;

    let renderer = TerminalRenderer::new(!no_color);
    let analyst = analyst.or_else(|| std::env::var("USER").ok());

    info!("irflow started");

    match command {
        Some(Playbook { command }) => {
            Cli::new(tracker, renderer, analyst)
                .handle_playbook_command(command)
                .await
        }
        Some(Flow { command }) => {
            Cli::new(tracker, renderer, analyst)
                .handle_flow_command(command)
                .await
        }
        Some(Step { command }) => {
            Cli::new(tracker, renderer, analyst)
                .handle_step_command(command)
                .await
        }
        Some(Watch(args)) => {
            Cli::new(tracker, renderer, analyst)
                .watch(args, server.as_deref(), token)
                .await
        }
        Some(Serve) => {
            info!("Starting irflow MCP server");
            run_stdio_server(IrflowMcpServer::new(tracker))
                .await
                .context("MCP server failed")
        }
        None => Cli::new(tracker, renderer, analyst).dashboard().await,
    }
}
