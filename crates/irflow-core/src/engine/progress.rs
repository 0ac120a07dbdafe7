//! Progress aggregation over steps, phases and whole flows.
//!
//! Only `completed` steps count towards progress. Skipped and failed steps
//! are terminal but never raise the percentage, so a flow with a failed or
//! skipped step finishes below 100.

use serde::{Deserialize, Serialize};

use super::resolver::{self, Resolution};
use crate::models::{status_counts, Flow, FlowStatus, StatusCounts, Step, StepStatus};

/// Overall health of a flow derived from its steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    /// Work remains and can proceed
    InProgress,
    /// Every step is terminal and no required step failed
    Succeeded,
    /// Every step is terminal but a required step failed
    Degraded,
    /// Work remains but no step can ever run again
    Stuck,
}

/// Rounded percentage with halves rounded up; an empty total yields 0.
///
/// # Examples
///
/// ```rust
/// use irflow_core::engine::progress::percentage;
///
/// assert_eq!(percentage(1, 3), 33);
/// assert_eq!(percentage(1, 8), 13);
/// assert_eq!(percentage(0, 0), 0);
/// ```
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed * 200 + total) / (total * 2)) as u8
}

fn completed_count(steps: &[&Step]) -> usize {
    steps
        .iter()
        .filter(|step| step.status == StepStatus::Completed)
        .count()
}

/// Completion percentage of the steps of one phase.
pub fn phase_progress(steps: &[&Step]) -> u8 {
    percentage(completed_count(steps), steps.len())
}

/// Completion percentage of a whole flow.
pub fn flow_progress(steps: &[&Step]) -> u8 {
    percentage(completed_count(steps), steps.len())
}

/// True when every step is terminal. An empty flow is complete.
pub fn is_flow_complete(steps: &[&Step]) -> bool {
    steps.iter().all(|step| step.status.is_terminal())
}

pub fn has_failed_required_steps(steps: &[&Step]) -> bool {
    steps
        .iter()
        .any(|step| step.required && step.status == StepStatus::Failed)
}

pub fn outcome(steps: &[&Step]) -> FlowOutcome {
    if is_flow_complete(steps) {
        if has_failed_required_steps(steps) {
            FlowOutcome::Degraded
        } else {
            FlowOutcome::Succeeded
        }
    } else if resolver::resolve(steps).is_deadlocked() {
        FlowOutcome::Stuck
    } else {
        FlowOutcome::InProgress
    }
}

/// Minutes of estimated effort left in steps that are not terminal.
pub fn estimated_minutes_remaining(steps: &[&Step]) -> u64 {
    steps
        .iter()
        .filter(|step| !step.status.is_terminal())
        .map(|step| u64::from(step.estimated_minutes))
        .fold(0, u64::saturating_add)
}

/// Progress of one phase inside a [`FlowProgress`] snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseProgress {
    pub name: String,
    pub title: String,
    pub percent: u8,
    pub completed: usize,
    pub total: usize,
}

/// Point-in-time progress report for a flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowProgress {
    pub flow_id: u64,
    pub incident_id: String,
    pub status: FlowStatus,
    pub percent: u8,
    pub completed: usize,
    pub total: usize,
    pub status_counts: StatusCounts,
    pub phases: Vec<PhaseProgress>,
    pub outcome: FlowOutcome,
    pub estimated_minutes_remaining: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
}

impl FlowProgress {
    /// Computes the progress snapshot of a flow.
    pub fn of(flow: &Flow) -> Self {
        let steps = flow.all_steps();

        let phases = flow
            .phases
            .iter()
            .map(|phase| {
                let members: Vec<&Step> = phase.steps.iter().collect();
                PhaseProgress {
                    name: phase.name.clone(),
                    title: phase.title.clone(),
                    percent: phase_progress(&members),
                    completed: completed_count(&members),
                    total: members.len(),
                }
            })
            .collect();

        let current_step = match resolver::resolve(&steps) {
            Resolution::Active { step } | Resolution::Ready { step } => Some(step.name),
            Resolution::Complete | Resolution::Deadlocked { .. } => None,
        };

        Self {
            flow_id: flow.id,
            incident_id: flow.incident_id.clone(),
            status: flow.status,
            percent: flow_progress(&steps),
            completed: completed_count(&steps),
            total: steps.len(),
            status_counts: status_counts(steps.iter().copied()),
            phases,
            outcome: outcome(&steps),
            estimated_minutes_remaining: estimated_minutes_remaining(&steps),
            current_step,
        }
    }
}
