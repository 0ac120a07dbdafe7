//! Step model definition and related functionality.

use std::collections::BTreeSet;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{playbook::StepDefinition, StepStatus, StepType};

/// Represents an individual step within a running flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// Unique key of the step within its flow
    pub name: String,

    /// Name of the phase the step belongs to
    pub phase: String,

    /// Brief title/summary of the step
    pub title: String,

    /// Detailed description of the step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Kind of work the step represents
    pub step_type: StepType,

    /// Whether the step must be executed for the flow to succeed
    pub required: bool,

    /// Informational effort estimate
    pub estimated_minutes: u32,

    /// Names of the steps that must be completed before this one can start
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,

    /// Current execution state
    pub status: StepStatus,

    /// Data recorded when the step completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_data: Option<serde_json::Value>,

    /// Error details recorded when the step failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_data: Option<serde_json::Value>,

    /// Latest input submitted by an analyst
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<serde_json::Value>,

    /// Why the step was skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,

    /// When the step was started (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,

    /// When the step reached a terminal state (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,

    /// When the step last changed (UTC)
    pub updated_at: Timestamp,
}

impl Step {
    /// Instantiates a pending step from its playbook definition.
    pub fn from_definition(phase: &str, definition: &StepDefinition, now: Timestamp) -> Self {
        Self {
            name: definition.name.clone(),
            phase: phase.to_string(),
            title: definition.title.clone(),
            description: definition.description.clone(),
            step_type: definition.step_type,
            required: definition.required,
            estimated_minutes: definition.estimated_minutes,
            depends_on: definition.depends_on.clone(),
            status: StepStatus::Pending,
            output_data: None,
            error_data: None,
            input_data: None,
            skip_reason: None,
            started_at: None,
            finished_at: None,
            updated_at: now,
        }
    }

    /// Time spent between start and finish, in whole seconds.
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end.as_second() - start.as_second()),
            _ => None,
        }
    }
}
