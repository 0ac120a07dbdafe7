//! MCP tool handlers implementation

use std::sync::Arc;

use irflow_core::{
    display::{CreateResult, UpdateResult},
    models::FlowSummary,
    params as core, Tracker,
};
use log::debug;
use rmcp::{
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    ErrorData,
};
use schemars::JsonSchema;
use serde::Deserialize;

use super::errors::to_mcp_error;

// ============================================================================
// Generic Parameter Wrapper
// ============================================================================
//
// Core parameter types only derive JsonSchema behind the `schema` feature and
// know nothing about rmcp. The transparent wrapper below gives every one of
// them the Deserialize + JsonSchema pair that `Parameters<T>` needs without
// a hand-written struct per tool.

/// Generic MCP wrapper for core parameter types
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct McpParams<T>(T)
where
    T: JsonSchema;

impl<T> JsonSchema for McpParams<T>
where
    T: JsonSchema,
{
    fn schema_name() -> std::borrow::Cow<'static, str> {
        T::schema_name()
    }

    fn json_schema(g: &mut schemars::SchemaGenerator) -> schemars::Schema {
        T::json_schema(g)
    }
}

impl<T> AsRef<T> for McpParams<T>
where
    T: JsonSchema,
{
    fn as_ref(&self) -> &T {
        &self.0
    }
}

pub type Id = McpParams<core::Id>;
pub type TriggerFlow = McpParams<core::TriggerFlow>;
pub type ShowFlow = McpParams<core::ShowFlow>;
pub type ListFlows = McpParams<core::ListFlows>;
pub type Dashboard = McpParams<core::Dashboard>;
pub type ShowPlaybook = McpParams<core::ShowPlaybook>;
pub type ApplyStepAction = McpParams<core::ApplyStepAction>;
pub type ControlFlow = McpParams<core::ControlFlow>;
pub type CommitFlow = McpParams<core::CommitFlow>;

pub type McpResult = Result<CallToolResult, ErrorData>;

fn text(output: impl ToString) -> McpResult {
    Ok(CallToolResult::success(vec![Content::text(
        output.to_string(),
    )]))
}

/// Handler implementations for the MCP server
pub struct McpHandlers {
    tracker: Arc<Tracker>,
}

impl McpHandlers {
    pub fn new(tracker: Arc<Tracker>) -> Self {
        Self { tracker }
    }

    pub async fn trigger_flow(&self, Parameters(params): Parameters<TriggerFlow>) -> McpResult {
        debug!("trigger_flow: {params:?}");

        let flow = self
            .tracker
            .trigger_flow(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to trigger flow", e))?;
        text(CreateResult::new(flow))
    }

    pub async fn show_flow(&self, Parameters(params): Parameters<ShowFlow>) -> McpResult {
        debug!("show_flow: {params:?}");

        let flow = self
            .tracker
            .show_flow(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to show flow", e))?;
        match flow {
            Some(flow) => text(flow),
            None => Err(ErrorData::invalid_params("Flow not found", None)),
        }
    }

    pub async fn list_flows(&self, Parameters(params): Parameters<ListFlows>) -> McpResult {
        debug!("list_flows: {params:?}");

        let flows = self
            .tracker
            .list_flows(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to list flows", e))?;
        text(flows)
    }

    pub async fn dashboard(&self, Parameters(params): Parameters<Dashboard>) -> McpResult {
        debug!("dashboard: {params:?}");

        let dashboard = self
            .tracker
            .dashboard(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to load dashboard", e))?;
        text(dashboard)
    }

    pub async fn next_step(&self, Parameters(params): Parameters<Id>) -> McpResult {
        debug!("next_step: {params:?}");

        let resolution = self
            .tracker
            .next_step(params.as_ref().id)
            .await
            .map_err(|e| to_mcp_error("Failed to resolve next step", e))?;
        text(resolution)
    }

    pub async fn flow_progress(&self, Parameters(params): Parameters<Id>) -> McpResult {
        debug!("flow_progress: {params:?}");

        let progress = self
            .tracker
            .progress(params.as_ref().id)
            .await
            .map_err(|e| to_mcp_error("Failed to compute progress", e))?;
        text(progress)
    }

    pub async fn step_action(&self, Parameters(params): Parameters<ApplyStepAction>) -> McpResult {
        debug!("step_action: {params:?}");

        let params = params.as_ref();
        let flow = self
            .tracker
            .apply_step_action(params)
            .await
            .map_err(|e| to_mcp_error("Failed to update step", e))?;

        // The step itself is what the caller acted on; the flow summary
        // shows where that leaves the flow
        let step = flow.step(&params.step).map(ToString::to_string);
        let summary = FlowSummary::from(&flow);
        text(format!(
            "Applied '{}' to step '{}'\n\n{}\n{summary}",
            params.action.name(),
            params.step,
            step.unwrap_or_default(),
        ))
    }

    pub async fn control_flow(&self, Parameters(params): Parameters<ControlFlow>) -> McpResult {
        debug!("control_flow: {params:?}");

        let control = &params.as_ref().control;
        let change = format!("{}: {}", control.target_status(), control.reason());
        let flow = self
            .tracker
            .control_flow(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to change flow status", e))?;
        text(UpdateResult::with_changes(flow, vec![change]))
    }

    pub async fn commit_flow(&self, Parameters(params): Parameters<CommitFlow>) -> McpResult {
        debug!("commit_flow: {params:?}");

        let commit = &params.as_ref().commit;
        let changes = vec![
            format!("Alert disposition: {}", commit.alert_disposition),
            format!("Incident status: {}", commit.incident_status),
        ];
        let flow = self
            .tracker
            .commit_flow(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to commit flow", e))?;
        text(UpdateResult::with_changes(flow, changes))
    }

    pub async fn list_playbooks(&self) -> McpResult {
        let playbooks = self
            .tracker
            .list_playbooks()
            .await
            .map_err(|e| to_mcp_error("Failed to list playbooks", e))?;
        text(playbooks)
    }

    pub async fn show_playbook(&self, Parameters(params): Parameters<ShowPlaybook>) -> McpResult {
        debug!("show_playbook: {params:?}");

        let name = &params.as_ref().name;
        let playbook = self
            .tracker
            .get_playbook(name)
            .await
            .map_err(|e| to_mcp_error("Failed to load playbook", e))?;
        match playbook {
            Some(playbook) => text(playbook),
            None => Err(ErrorData::invalid_params(
                format!("Playbook '{name}' not found"),
                None,
            )),
        }
    }
}
