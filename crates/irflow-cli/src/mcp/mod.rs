//! MCP server for irflow
//!
//! Exposes flow tracking as Model Context Protocol tools so an assistant can
//! trigger playbooks, walk analysts through steps and commit finished flows.
//! Tool output is the same markdown the CLI renders.

use std::sync::Arc;

use anyhow::Result;
use irflow_core::Tracker;
use log::{debug, error, info};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use tokio::signal::unix::{signal, SignalKind};

pub mod errors;
pub mod handlers;

pub use handlers::{
    ApplyStepAction, CommitFlow, ControlFlow, Dashboard, Id, ListFlows, McpResult, ShowFlow,
    ShowPlaybook, TriggerFlow,
};

/// MCP server for irflow
#[derive(Clone)]
pub struct IrflowMcpServer {
    tracker: Arc<Tracker>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl IrflowMcpServer {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            tracker: Arc::new(tracker),
            tool_router: Self::tool_router(),
        }
    }

    fn handlers(&self) -> handlers::McpHandlers {
        handlers::McpHandlers::new(self.tracker.clone())
    }

    #[tool(
        name = "trigger_flow",
        description = "Instantiate a playbook against an incident. Requires the playbook name and incident_id; started_by records the analyst. Every step starts 'pending'. Fails if the incident already has an active or paused flow. Returns the new flow ID."
    )]
    async fn trigger_flow(&self, params: Parameters<TriggerFlow>) -> McpResult {
        self.handlers().trigger_flow(params).await
    }

    #[tool(
        name = "show_flow",
        description = "Show a flow with its phases, steps, statuses, step output and final report. Identify the flow by id, or by incident_id to get that incident's in-flight flow (or its latest one). Provide exactly one of the two."
    )]
    async fn show_flow(&self, params: Parameters<ShowFlow>) -> McpResult {
        self.handlers().show_flow(params).await
    }

    #[tool(
        name = "list_flows",
        description = "List flows with progress and current step. Returns active and paused flows by default; set all=true to include completed and cancelled flows. Filter with status, incident_id or started_by."
    )]
    async fn list_flows(&self, params: Parameters<ListFlows>) -> McpResult {
        self.handlers().list_flows(params).await
    }

    #[tool(
        name = "dashboard",
        description = "Overview of flows in flight with step counts per status across all of them. Pass analyst to see only the flows that analyst triggered."
    )]
    async fn dashboard(&self, params: Parameters<Dashboard>) -> McpResult {
        self.handlers().dashboard(params).await
    }

    #[tool(
        name = "next_step",
        description = "Resolve what to work on next in a flow: the step already underway, the first pending step whose dependencies are satisfied, a note that every step is finished, or the list of blocked steps when the flow is deadlocked by failed dependencies."
    )]
    async fn next_step(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().next_step(params).await
    }

    #[tool(
        name = "flow_progress",
        description = "Completion percentage of a flow overall and per phase, step counts per status, outcome (in progress, succeeded, finished with failed steps, stuck) and estimated minutes remaining."
    )]
    async fn flow_progress(&self, params: Parameters<Id>) -> McpResult {
        self.handlers().flow_progress(params).await
    }

    #[tool(
        name = "step_action",
        description = "Move one step of an active flow through its lifecycle. Actions: 'start' (pending step whose dependencies are completed or skipped), 'complete' with optional output, 'fail' with optional error, 'skip' with reason (optional steps only), 'await_input', 'submit_input' with input, 'await_approval', 'approve' with approver and optional note, 'reject' with approver and reason.

        Example:
        {
          \"flow_id\": 3,
          \"step\": \"isolate-host\",
          \"action\": \"complete\",
          \"output\": {\"hosts\": [\"ws-114\"]}
        }"
    )]
    async fn step_action(&self, params: Parameters<ApplyStepAction>) -> McpResult {
        self.handlers().step_action(params).await
    }

    #[tool(
        name = "control_flow",
        description = "Pause, resume or cancel a flow. Provide flow_id, action ('pause', 'resume' or 'cancel') and a reason. Only active flows can be paused, only paused flows resumed; completed and cancelled flows cannot change."
    )]
    async fn control_flow(&self, params: Parameters<ControlFlow>) -> McpResult {
        self.handlers().control_flow(params).await
    }

    #[tool(
        name = "commit_flow",
        description = "Commit a finished flow. Every step must be completed, failed or skipped. Provide flow_id, final_report (markdown), alert_disposition ('false_positive', 'resolved' or 'closed') and incident_status ('resolved' or 'closed'). The flow becomes 'completed'."
    )]
    async fn commit_flow(&self, params: Parameters<CommitFlow>) -> McpResult {
        self.handlers().commit_flow(params).await
    }

    #[tool(
        name = "list_playbooks",
        description = "List the playbooks available to trigger, with their phase and step counts."
    )]
    async fn list_playbooks(&self) -> McpResult {
        self.handlers().list_playbooks().await
    }

    #[tool(
        name = "show_playbook",
        description = "Show a playbook definition by name: phases, steps, step types, dependencies and estimates."
    )]
    async fn show_playbook(&self, params: Parameters<ShowPlaybook>) -> McpResult {
        self.handlers().show_playbook(params).await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for IrflowMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "irflow".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(r#"irflow tracks incident-response playbooks as they are executed.

## Core Concepts
- **Playbook**: a reusable template of phases, each holding ordered steps. Steps may depend on other steps and may be optional.
- **Flow**: one playbook running against one incident. An incident has at most one active or paused flow.
- **Step status**: pending, in_progress, waiting_for_input, waiting_for_approval, completed, failed, skipped.

## Working a Flow
1. Pick a playbook with `list_playbooks` and start it with `trigger_flow`
2. Ask `next_step` what to do, then `step_action` with 'start'
3. Finish the step with 'complete' (or 'fail'); park it with 'await_input' or 'await_approval' when it needs someone else
4. Check `flow_progress` along the way
5. When every step is finished, `commit_flow` with a final report

## Rules
- A step can start only when all of its dependencies are completed or skipped
- Only optional steps can be skipped
- Step actions need an active flow; paused flows must be resumed with `control_flow` first
- A failed dependency deadlocks the steps behind it; `next_step` lists them and commit is refused"#.to_string()),
        }
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: IrflowMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting irflow MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
    }

    info!("MCP server shutdown complete");
    Ok(())
}
