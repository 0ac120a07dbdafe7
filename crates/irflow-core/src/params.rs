//! Parameter structures for irflow operations
//!
//! This module contains the parameter structures shared by every interface
//! (CLI, MCP) and by the remote backend's request bodies. Interface layers
//! wrap them with their own framework derives and convert into these types,
//! so the tracker API only ever sees one shape per operation.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │   MCP Params    │    │  Core Params    │
//! │  (clap derives) │───▶│ (serde derives) │───▶│ (minimal deps)  │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! JSON schemas for the MCP tools are generated only when the `schema`
//! feature is enabled.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{FlowError, Result},
    models::{FlowCommit, FlowControl, FlowFilter, FlowStatus, StepAction},
};

/// Generic parameters for operations requiring just a flow ID.
///
/// Used for show_flow, next_step and flow_progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Id {
    /// The ID of the flow to operate on
    pub id: u64,
}

/// Parameters for instantiating a playbook against an incident.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct TriggerFlow {
    /// Name of the playbook to run
    pub playbook: String,
    /// Incident the flow responds to
    pub incident_id: String,
    /// Analyst triggering the flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_by: Option<String>,
}

/// Parameters for looking up one flow, either by ID or by incident.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ShowFlow {
    /// Flow ID
    #[serde(default)]
    pub id: Option<u64>,
    /// Incident ID; selects the incident's in-flight or latest flow
    #[serde(default)]
    pub incident_id: Option<String>,
}

/// How a [`ShowFlow`] request identifies its flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowLookup {
    ById(u64),
    ByIncident(String),
}

impl ShowFlow {
    /// Exactly one of `id` and `incident_id` must be set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use irflow_core::params::{FlowLookup, ShowFlow};
    ///
    /// let by_incident = ShowFlow { id: None, incident_id: Some("INC-7".to_string()) };
    /// assert_eq!(by_incident.lookup()?, FlowLookup::ByIncident("INC-7".to_string()));
    ///
    /// let neither = ShowFlow::default();
    /// assert!(neither.lookup().is_err());
    /// # irflow_core::Result::<()>::Ok(())
    /// ```
    pub fn lookup(&self) -> Result<FlowLookup> {
        match (self.id, self.incident_id.as_deref()) {
            (Some(id), None) => Ok(FlowLookup::ById(id)),
            (None, Some(incident_id)) if !incident_id.trim().is_empty() => {
                Ok(FlowLookup::ByIncident(incident_id.to_string()))
            }
            (Some(_), Some(_)) => Err(FlowError::invalid_input("id")
                .with_reason("Provide either a flow ID or an incident ID, not both")),
            _ => Err(FlowError::invalid_input("id")
                .with_reason("A flow ID or an incident ID is required")),
        }
    }
}

/// Parameters for listing flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListFlows {
    /// Only flows in this status ('active', 'paused', 'completed', 'cancelled')
    #[serde(default)]
    pub status: Option<String>,
    /// Only flows for this incident
    #[serde(default)]
    pub incident_id: Option<String>,
    /// Only flows triggered by this analyst
    #[serde(default)]
    pub started_by: Option<String>,
    /// Include completed and cancelled flows
    #[serde(default)]
    pub all: bool,
}

impl ListFlows {
    /// Converts the request into a storage filter, validating the status.
    pub fn to_filter(&self) -> Result<FlowFilter> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                s.parse::<FlowStatus>().map_err(|_| {
                    FlowError::invalid_input("status").with_reason(format!(
                        "Invalid status: {s}. Must be 'active', 'paused', 'completed', or 'cancelled'"
                    ))
                })
            })
            .transpose()?;

        Ok(FlowFilter {
            status,
            incident_id: self.incident_id.clone(),
            started_by: self.started_by.clone(),
            in_flight_only: !self.all,
        })
    }
}

/// Parameters for the analyst dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Dashboard {
    /// Analyst whose in-flight flows are shown; every analyst when omitted
    #[serde(default)]
    pub analyst: Option<String>,
}

/// Parameters for showing a playbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ShowPlaybook {
    /// Playbook name
    pub name: String,
}

/// Parameters for applying an action to one step.
///
/// The action is flattened, so a request reads
/// `{"flow_id": 3, "step": "isolate", "action": "complete", "output": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ApplyStepAction {
    /// ID of the flow the step belongs to
    pub flow_id: u64,
    /// Name of the step
    pub step: String,
    /// Action to apply
    #[serde(flatten)]
    pub action: StepAction,
}

/// Parameters for pausing, resuming or cancelling a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ControlFlow {
    /// ID of the flow
    pub flow_id: u64,
    /// Lifecycle change and its reason
    #[serde(flatten)]
    pub control: FlowControl,
}

/// Parameters for committing a finished flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CommitFlow {
    /// ID of the flow
    pub flow_id: u64,
    /// Final report, alert disposition and incident status
    #[serde(flatten)]
    pub commit: FlowCommit,
}
