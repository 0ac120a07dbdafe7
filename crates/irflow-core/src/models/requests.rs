//! Requests that change step or flow state.
//!
//! These travel unchanged between the tracker, the local store and the REST
//! backend, so each one is a serde-tagged enum or plain struct.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{AlertDisposition, FlowStatus, IncidentStatus, StepStatus};

/// An action applied to one step of a flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// pending → in_progress
    Start,
    /// in_progress → completed
    Complete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<serde_json::Value>,
    },
    /// in_progress → failed
    Fail {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<serde_json::Value>,
    },
    /// pending → skipped, optional steps only
    Skip { reason: String },
    /// in_progress → waiting_for_input
    AwaitInput,
    /// waiting_for_input → in_progress
    SubmitInput { input: serde_json::Value },
    /// in_progress → waiting_for_approval
    AwaitApproval,
    /// waiting_for_approval → completed
    Approve {
        approver: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// waiting_for_approval → failed
    Reject { approver: String, reason: String },
}

impl StepAction {
    /// Short name used in logs and routes.
    pub fn name(&self) -> &'static str {
        match self {
            StepAction::Start => "start",
            StepAction::Complete { .. } => "complete",
            StepAction::Fail { .. } => "fail",
            StepAction::Skip { .. } => "skip",
            StepAction::AwaitInput => "await_input",
            StepAction::SubmitInput { .. } => "submit_input",
            StepAction::AwaitApproval => "await_approval",
            StepAction::Approve { .. } => "approve",
            StepAction::Reject { .. } => "reject",
        }
    }

    /// Status the step ends up in when the action succeeds.
    pub fn target_status(&self) -> StepStatus {
        match self {
            StepAction::Start | StepAction::SubmitInput { .. } => StepStatus::InProgress,
            StepAction::Complete { .. } | StepAction::Approve { .. } => StepStatus::Completed,
            StepAction::Fail { .. } | StepAction::Reject { .. } => StepStatus::Failed,
            StepAction::Skip { .. } => StepStatus::Skipped,
            StepAction::AwaitInput => StepStatus::WaitingForInput,
            StepAction::AwaitApproval => StepStatus::WaitingForApproval,
        }
    }
}

/// Flow-level lifecycle change, each carrying a reason for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FlowControl {
    Pause { reason: String },
    Resume { reason: String },
    Cancel { reason: String },
}

impl FlowControl {
    pub fn reason(&self) -> &str {
        match self {
            FlowControl::Pause { reason }
            | FlowControl::Resume { reason }
            | FlowControl::Cancel { reason } => reason,
        }
    }

    pub fn target_status(&self) -> FlowStatus {
        match self {
            FlowControl::Pause { .. } => FlowStatus::Paused,
            FlowControl::Resume { .. } => FlowStatus::Active,
            FlowControl::Cancel { .. } => FlowStatus::Cancelled,
        }
    }
}

/// Final record that closes a flow and the incident it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct FlowCommit {
    /// Narrative report of what was done
    pub final_report: String,
    /// What happens to the originating alert
    pub alert_disposition: AlertDisposition,
    /// Status the incident is moved to
    pub incident_status: IncidentStatus,
}
