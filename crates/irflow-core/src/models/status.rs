//! Status and kind enumerations shared by every consumer of the tracker.

use std::str::FromStr;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Execution state of a single step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not been started
    Pending,

    /// Step is being worked on
    InProgress,

    /// Step is parked until an analyst supplies input
    WaitingForInput,

    /// Step is parked until someone approves or rejects it
    WaitingForApproval,

    /// Step finished successfully
    Completed,

    /// Step finished unsuccessfully
    Failed,

    /// Step was deliberately not executed
    Skipped,
}

impl StepStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [StepStatus; 7] = [
        StepStatus::Pending,
        StepStatus::InProgress,
        StepStatus::WaitingForInput,
        StepStatus::WaitingForApproval,
        StepStatus::Completed,
        StepStatus::Failed,
        StepStatus::Skipped,
    ];

    /// Wire and database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::WaitingForInput => "waiting_for_input",
            StepStatus::WaitingForApproval => "waiting_for_approval",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped
        )
    }

    /// Started but not yet finished.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            StepStatus::InProgress | StepStatus::WaitingForInput | StepStatus::WaitingForApproval
        )
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use irflow_core::models::StepStatus;
    ///
    /// assert_eq!(StepStatus::Completed.with_icon(), "✓ Completed");
    /// assert_eq!(StepStatus::InProgress.with_icon(), "➤ In Progress");
    /// assert_eq!(StepStatus::Pending.with_icon(), "○ Pending");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Pending => "○ Pending",
            StepStatus::InProgress => "➤ In Progress",
            StepStatus::WaitingForInput => "✎ Waiting for Input",
            StepStatus::WaitingForApproval => "⧗ Waiting for Approval",
            StepStatus::Completed => "✓ Completed",
            StepStatus::Failed => "✗ Failed",
            StepStatus::Skipped => "» Skipped",
        }
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "in_progress" | "inprogress" => Ok(StepStatus::InProgress),
            "waiting_for_input" => Ok(StepStatus::WaitingForInput),
            "waiting_for_approval" => Ok(StepStatus::WaitingForApproval),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            "skipped" => Ok(StepStatus::Skipped),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

/// Lifecycle of a whole flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    /// Flow is running and accepts step actions
    #[default]
    Active,

    /// Flow is on hold
    Paused,

    /// Flow was committed to the incident record
    Completed,

    /// Flow was abandoned
    Cancelled,
}

impl FlowStatus {
    /// Wire and database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Active => "active",
            FlowStatus::Paused => "paused",
            FlowStatus::Completed => "completed",
            FlowStatus::Cancelled => "cancelled",
        }
    }

    /// Active and paused flows are still in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, FlowStatus::Active | FlowStatus::Paused)
    }
}

impl FromStr for FlowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(FlowStatus::Active),
            "paused" => Ok(FlowStatus::Paused),
            "completed" => Ok(FlowStatus::Completed),
            "cancelled" | "canceled" => Ok(FlowStatus::Cancelled),
            _ => Err(format!("Invalid flow status: {s}")),
        }
    }
}

/// Kind of work a step represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    #[default]
    ManualAction,
    AutomatedAction,
    UserInput,
    Approval,
    Notification,
    Analysis,
    DecisionPoint,
    ArtifactCollection,
    ReportGeneration,
}

impl StepType {
    /// Wire and database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::ManualAction => "manual_action",
            StepType::AutomatedAction => "automated_action",
            StepType::UserInput => "user_input",
            StepType::Approval => "approval",
            StepType::Notification => "notification",
            StepType::Analysis => "analysis",
            StepType::DecisionPoint => "decision_point",
            StepType::ArtifactCollection => "artifact_collection",
            StepType::ReportGeneration => "report_generation",
        }
    }
}

impl FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual_action" => Ok(StepType::ManualAction),
            "automated_action" => Ok(StepType::AutomatedAction),
            "user_input" => Ok(StepType::UserInput),
            "approval" => Ok(StepType::Approval),
            "notification" => Ok(StepType::Notification),
            "analysis" => Ok(StepType::Analysis),
            "decision_point" => Ok(StepType::DecisionPoint),
            "artifact_collection" => Ok(StepType::ArtifactCollection),
            "report_generation" => Ok(StepType::ReportGeneration),
            _ => Err(format!("Invalid step type: {s}")),
        }
    }
}

/// What happens to the alert that opened the incident once the flow is
/// committed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum AlertDisposition {
    FalsePositive,
    Resolved,
    Closed,
}

impl AlertDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDisposition::FalsePositive => "false_positive",
            AlertDisposition::Resolved => "resolved",
            AlertDisposition::Closed => "closed",
        }
    }
}

impl FromStr for AlertDisposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "false_positive" | "false-positive" => Ok(AlertDisposition::FalsePositive),
            "resolved" => Ok(AlertDisposition::Resolved),
            "closed" => Ok(AlertDisposition::Closed),
            _ => Err(format!("Invalid alert disposition: {s}")),
        }
    }
}

/// Status the incident is moved to when the flow is committed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Resolved,
    Closed,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Closed => "closed",
        }
    }
}

impl FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resolved" => Ok(IncidentStatus::Resolved),
            "closed" => Ok(IncidentStatus::Closed),
            _ => Err(format!("Invalid incident status: {s}")),
        }
    }
}
