//! Summary models derived from flow snapshots.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Flow, FlowStatus, StepStatus};
use crate::engine::progress::{self, FlowOutcome};

/// Number of steps in each status. All seven statuses are always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct StatusCounts(BTreeMap<StepStatus, usize>);

impl Default for StatusCounts {
    fn default() -> Self {
        Self(StepStatus::ALL.iter().map(|status| (*status, 0)).collect())
    }
}

impl StatusCounts {
    /// Count for one status.
    pub fn get(&self, status: StepStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub(crate) fn increment(&mut self, status: StepStatus) {
        *self.0.entry(status).or_insert(0) += 1;
    }

    /// Adds another set of counts into this one.
    pub fn merge(&mut self, other: &StatusCounts) {
        for (status, count) in other.iter() {
            *self.0.entry(status).or_insert(0) += count;
        }
    }

    /// Sum over every status.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Iterate `(status, count)` pairs in lifecycle order.
    pub fn iter(&self) -> impl Iterator<Item = (StepStatus, usize)> + '_ {
        self.0.iter().map(|(status, count)| (*status, *count))
    }
}

/// Compact view of a flow for lists and dashboards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowSummary {
    pub id: u64,
    pub playbook: String,
    pub incident_id: String,
    pub status: FlowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_by: Option<String>,
    pub total_steps: usize,
    pub completed_steps: usize,
    /// Rounded completion percentage
    pub progress: u8,
    pub outcome: FlowOutcome,
    /// Name of the step currently underway or next eligible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Flow> for FlowSummary {
    fn from(flow: &Flow) -> Self {
        let steps = flow.all_steps();
        let completed_steps = steps
            .iter()
            .filter(|step| step.status == StepStatus::Completed)
            .count();

        Self {
            id: flow.id,
            playbook: flow.playbook.clone(),
            incident_id: flow.incident_id.clone(),
            status: flow.status,
            started_by: flow.started_by.clone(),
            total_steps: steps.len(),
            completed_steps,
            progress: progress::flow_progress(&steps),
            outcome: progress::outcome(&steps),
            current_step: flow.current_step().map(|step| step.name.clone()),
            created_at: flow.created_at,
            updated_at: flow.updated_at,
        }
    }
}

/// In-flight flows of one analyst, with aggregate step counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    /// Analyst the dashboard was built for; `None` means everyone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyst: Option<String>,
    pub flows: Vec<FlowSummary>,
    pub status_counts: StatusCounts,
}

impl DashboardSummary {
    /// Builds a dashboard from full flow snapshots.
    pub fn from_flows(analyst: Option<&str>, flows: &[Flow]) -> Self {
        let mut status_counts = StatusCounts::default();
        for flow in flows {
            status_counts.merge(&flow.status_counts());
        }

        Self {
            analyst: analyst.map(String::from),
            flows: flows.iter().map(FlowSummary::from).collect(),
            status_counts,
        }
    }

    /// Flows that need attention because no step can run.
    pub fn stuck_flows(&self) -> impl Iterator<Item = &FlowSummary> {
        self.flows
            .iter()
            .filter(|summary| summary.outcome == FlowOutcome::Stuck)
    }
}
