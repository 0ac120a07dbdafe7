//! Dependency resolution over a flow's steps.
//!
//! All functions take the steps of one flow in global order (phase order,
//! then step order). Dependencies are looked up by step name; a name that
//! does not resolve to a step is treated as an unmet dependency.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Step, StepStatus};

/// Where a flow stands with respect to its next piece of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
    /// A step is already in progress or waiting
    Active { step: Step },
    /// No step is underway; this one is eligible to start
    Ready { step: Step },
    /// Every step is terminal
    Complete,
    /// Unfinished steps remain but none of them can ever start
    Deadlocked { blocked: Vec<String> },
}

impl Resolution {
    /// The step the resolution points at, if any.
    pub fn step(&self) -> Option<&Step> {
        match self {
            Resolution::Active { step } | Resolution::Ready { step } => Some(step),
            Resolution::Complete | Resolution::Deadlocked { .. } => None,
        }
    }

    pub fn is_deadlocked(&self) -> bool {
        matches!(self, Resolution::Deadlocked { .. })
    }
}

fn find<'a>(steps: &[&'a Step], name: &str) -> Option<&'a Step> {
    steps.iter().copied().find(|step| step.name == name)
}

/// Names of the dependencies of `step` that are not completed, in sorted
/// order.
pub fn unmet_dependencies(step: &Step, all_steps: &[&Step]) -> Vec<String> {
    step.depends_on
        .iter()
        .filter(|name| {
            find(all_steps, name).map_or(true, |dep| dep.status != StepStatus::Completed)
        })
        .cloned()
        .collect()
}

/// A step can execute when it is pending and every dependency is completed.
pub fn can_execute(step: &Step, all_steps: &[&Step]) -> bool {
    step.status == StepStatus::Pending && unmet_dependencies(step, all_steps).is_empty()
}

/// First step in global order that can execute.
pub fn next_executable_step<'a>(all_steps: &[&'a Step]) -> Option<&'a Step> {
    all_steps
        .iter()
        .copied()
        .find(|step| can_execute(step, all_steps))
}

/// Pending steps that can never become eligible because a step somewhere in
/// their dependency chain failed, was skipped or does not exist.
pub fn blocked_by_failure<'a>(all_steps: &[&'a Step]) -> Vec<&'a Step> {
    let mut doomed: HashSet<&str> = HashSet::new();

    // Propagate until stable; each pass can only grow the set.
    loop {
        let mut changed = false;
        for step in all_steps {
            if step.status != StepStatus::Pending || doomed.contains(step.name.as_str()) {
                continue;
            }
            let dead_end = step.depends_on.iter().any(|name| match find(all_steps, name) {
                None => true,
                Some(dep) => {
                    matches!(dep.status, StepStatus::Failed | StepStatus::Skipped)
                        || doomed.contains(dep.name.as_str())
                }
            });
            if dead_end {
                doomed.insert(step.name.as_str());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    all_steps
        .iter()
        .copied()
        .filter(|step| doomed.contains(step.name.as_str()))
        .collect()
}

/// Classifies the flow: a step underway, a step ready, complete, or
/// deadlocked.
pub fn resolve(all_steps: &[&Step]) -> Resolution {
    if let Some(step) = all_steps.iter().find(|step| step.status.is_active()) {
        return Resolution::Active {
            step: (*step).clone(),
        };
    }

    if let Some(step) = next_executable_step(all_steps) {
        return Resolution::Ready { step: step.clone() };
    }

    let blocked: Vec<String> = all_steps
        .iter()
        .filter(|step| !step.status.is_terminal())
        .map(|step| step.name.clone())
        .collect();

    if blocked.is_empty() {
        Resolution::Complete
    } else {
        Resolution::Deadlocked { blocked }
    }
}
