//! Flow model: a playbook instantiated against one incident.
//!
//! The flow owns the ordered Phase → Step hierarchy. Global step order is
//! phase order first, then step order inside the phase; every accessor here
//! preserves it.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{FlowCommit, FlowStatus, Playbook, Step, StatusCounts};
use crate::engine::resolver;

/// One running instance of a playbook bound to an incident.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flow {
    /// Unique identifier for the flow
    pub id: u64,

    /// Name of the playbook the flow was created from
    pub playbook: String,

    /// External identifier of the incident the flow responds to
    pub incident_id: String,

    /// Lifecycle state of the flow
    pub status: FlowStatus,

    /// Analyst who triggered the flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_by: Option<String>,

    /// Reason given for the latest pause, resume or cancel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,

    /// Phases in execution order
    pub phases: Vec<Phase>,

    /// Commit record, present once the flow is completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<FlowCommit>,

    /// Timestamp when the flow was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the flow was last updated (UTC)
    pub updated_at: Timestamp,
}

/// Ordered group of steps inside a flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<Step>,
}

/// Steps grouped by phase name, in first-seen phase order.
pub type PhaseGroups<'a> = Vec<(&'a str, Vec<&'a Step>)>;

impl Flow {
    /// Creates a new active flow with every step pending.
    pub fn instantiate(
        id: u64,
        playbook: &Playbook,
        incident_id: &str,
        started_by: Option<&str>,
        now: Timestamp,
    ) -> Self {
        let phases = playbook
            .phases
            .iter()
            .map(|phase| Phase {
                name: phase.name.clone(),
                title: phase.title.clone(),
                description: phase.description.clone(),
                steps: phase
                    .steps
                    .iter()
                    .map(|definition| Step::from_definition(&phase.name, definition, now))
                    .collect(),
            })
            .collect();

        Self {
            id,
            playbook: playbook.name.clone(),
            incident_id: incident_id.to_string(),
            status: FlowStatus::Active,
            started_by: started_by.map(String::from),
            status_reason: None,
            phases,
            commit: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// All steps in global order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.phases.iter().flat_map(|phase| phase.steps.iter())
    }

    /// All steps in global order, collected.
    pub fn all_steps(&self) -> Vec<&Step> {
        self.steps().collect()
    }

    /// Looks up a step by name.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps().find(|step| step.name == name)
    }

    pub(crate) fn step_mut(&mut self, name: &str) -> Option<&mut Step> {
        self.phases
            .iter_mut()
            .flat_map(|phase| phase.steps.iter_mut())
            .find(|step| step.name == name)
    }

    /// Looks up a phase by name.
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.name == name)
    }

    /// Ordered steps of one phase, or `None` for an unknown phase.
    pub fn steps_in_phase(&self, phase_name: &str) -> Option<&[Step]> {
        self.phase(phase_name).map(|phase| phase.steps.as_slice())
    }

    /// Number of steps in each status across the flow.
    pub fn status_counts(&self) -> StatusCounts {
        status_counts(self.steps())
    }

    /// The flow's steps grouped by phase, in phase order.
    pub fn group_by_phase(&self) -> PhaseGroups<'_> {
        group_by_phase(self.steps())
    }

    /// The step an analyst should be looking at: the first step already
    /// underway, otherwise the next eligible one.
    pub fn current_step(&self) -> Option<&Step> {
        let steps = self.all_steps();
        steps
            .iter()
            .copied()
            .find(|step| step.status.is_active())
            .or_else(|| resolver::next_executable_step(&steps))
    }

    /// Number of steps not yet in a terminal state.
    pub fn remaining_steps(&self) -> usize {
        self.steps().filter(|step| !step.status.is_terminal()).count()
    }
}

/// Counts steps per status; every status is present, defaulting to zero.
pub fn status_counts<'a, I>(steps: I) -> StatusCounts
where
    I: IntoIterator<Item = &'a Step>,
{
    let mut counts = StatusCounts::default();
    for step in steps {
        counts.increment(step.status);
    }
    counts
}

/// Groups steps by their phase name, keeping the order in which phases and
/// steps are first seen.
pub fn group_by_phase<'a, I>(steps: I) -> PhaseGroups<'a>
where
    I: IntoIterator<Item = &'a Step>,
{
    let mut groups: PhaseGroups<'a> = Vec::new();
    for step in steps {
        match groups.iter_mut().find(|(phase, _)| *phase == step.phase) {
            Some((_, members)) => members.push(step),
            None => groups.push((step.phase.as_str(), vec![step])),
        }
    }
    groups
}
