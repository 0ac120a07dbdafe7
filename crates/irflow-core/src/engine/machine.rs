//! Step and flow state machines.
//!
//! Every transition has a `check_*` form that only validates against a
//! snapshot and an `apply_*` form that validates and then mutates. The
//! tracker uses the checks to reject impossible requests before they reach
//! the backend; backends use the apply forms as the authority.

use jiff::Timestamp;
use serde_json::json;

use super::resolver::{self, Resolution};
use crate::{
    error::{FlowError, Result},
    models::{Flow, FlowCommit, FlowControl, FlowStatus, Step, StepAction, StepStatus},
};

/// The only status an action may be applied from.
pub fn source_status(action: &StepAction) -> StepStatus {
    match action {
        StepAction::Start | StepAction::Skip { .. } => StepStatus::Pending,
        StepAction::Complete { .. }
        | StepAction::Fail { .. }
        | StepAction::AwaitInput
        | StepAction::AwaitApproval => StepStatus::InProgress,
        StepAction::SubmitInput { .. } => StepStatus::WaitingForInput,
        StepAction::Approve { .. } | StepAction::Reject { .. } => StepStatus::WaitingForApproval,
    }
}

fn check_step(flow: &Flow, step: &Step, action: &StepAction) -> Result<()> {
    let from = step.status;
    if from != source_status(action) {
        return Err(FlowError::InvalidTransition {
            step: step.name.clone(),
            from,
            to: action.target_status(),
        });
    }

    match action {
        StepAction::Skip { .. } if step.required => Err(FlowError::RequiredStep {
            step: step.name.clone(),
        }),
        StepAction::Start | StepAction::Complete { .. } => {
            let unmet = resolver::unmet_dependencies(step, &flow.all_steps());
            if unmet.is_empty() {
                Ok(())
            } else {
                Err(FlowError::DependencyNotSatisfied {
                    step: step.name.clone(),
                    unmet,
                })
            }
        }
        StepAction::Approve { approver, .. } | StepAction::Reject { approver, .. }
            if approver.trim().is_empty() =>
        {
            Err(FlowError::invalid_input("approver").with_reason("Approver cannot be empty"))
        }
        _ => Ok(()),
    }
}

/// Validates a step action against the flow without changing it.
pub fn check_step_action(flow: &Flow, step_name: &str, action: &StepAction) -> Result<()> {
    if flow.status != FlowStatus::Active {
        return Err(FlowError::FlowNotActive {
            id: flow.id,
            status: flow.status,
        });
    }

    let step = flow.step(step_name).ok_or_else(|| FlowError::StepNotFound {
        flow_id: flow.id,
        name: step_name.to_string(),
    })?;

    check_step(flow, step, action)
}

/// Applies a step action, recording its data and timestamps.
pub fn apply_step_action(
    flow: &mut Flow,
    step_name: &str,
    action: &StepAction,
    now: Timestamp,
) -> Result<()> {
    check_step_action(flow, step_name, action)?;

    let flow_id = flow.id;
    let step = flow
        .step_mut(step_name)
        .ok_or_else(|| FlowError::StepNotFound {
            flow_id,
            name: step_name.to_string(),
        })?;

    match action {
        StepAction::Start => step.started_at = Some(now),
        StepAction::Complete { output } => {
            step.output_data = output.clone();
            step.finished_at = Some(now);
        }
        StepAction::Fail { error } => {
            step.error_data = error.clone();
            step.finished_at = Some(now);
        }
        StepAction::Skip { reason } => {
            step.skip_reason = Some(reason.clone());
            step.finished_at = Some(now);
        }
        StepAction::AwaitInput | StepAction::AwaitApproval => {}
        StepAction::SubmitInput { input } => step.input_data = Some(input.clone()),
        StepAction::Approve { approver, note } => {
            step.output_data = Some(json!({ "approved_by": approver, "note": note }));
            step.finished_at = Some(now);
        }
        StepAction::Reject { approver, reason } => {
            step.error_data = Some(json!({ "rejected_by": approver, "reason": reason }));
            step.finished_at = Some(now);
        }
    }

    step.status = action.target_status();
    step.updated_at = now;
    flow.updated_at = now;
    Ok(())
}

/// Validates a pause, resume or cancel request.
pub fn check_control(flow: &Flow, control: &FlowControl) -> Result<()> {
    let allowed = matches!(
        (control, flow.status),
        (FlowControl::Pause { .. }, FlowStatus::Active)
            | (FlowControl::Resume { .. }, FlowStatus::Paused)
            | (
                FlowControl::Cancel { .. },
                FlowStatus::Active | FlowStatus::Paused
            )
    );

    if allowed {
        Ok(())
    } else {
        Err(FlowError::InvalidFlowTransition {
            id: flow.id,
            from: flow.status,
            to: control.target_status(),
        })
    }
}

pub fn apply_control(flow: &mut Flow, control: &FlowControl, now: Timestamp) -> Result<()> {
    check_control(flow, control)?;
    flow.status = control.target_status();
    flow.status_reason = Some(control.reason().to_string());
    flow.updated_at = now;
    Ok(())
}

/// Validates that a flow can be committed: it must be active, every step
/// terminal and the final report non-empty.
pub fn check_commit(flow: &Flow, commit: &FlowCommit) -> Result<()> {
    if flow.status != FlowStatus::Active {
        return Err(FlowError::InvalidFlowTransition {
            id: flow.id,
            from: flow.status,
            to: FlowStatus::Completed,
        });
    }

    if commit.final_report.trim().is_empty() {
        return Err(FlowError::invalid_input("final_report")
            .with_reason("Final report cannot be empty"));
    }

    match resolver::resolve(&flow.all_steps()) {
        Resolution::Complete => Ok(()),
        Resolution::Deadlocked { blocked } => Err(FlowError::DeadlockDetected {
            id: flow.id,
            blocked,
        }),
        Resolution::Active { .. } | Resolution::Ready { .. } => Err(FlowError::FlowIncomplete {
            id: flow.id,
            remaining: flow.remaining_steps(),
        }),
    }
}

pub fn apply_commit(flow: &mut Flow, commit: &FlowCommit, now: Timestamp) -> Result<()> {
    check_commit(flow, commit)?;
    flow.status = FlowStatus::Completed;
    flow.commit = Some(commit.clone());
    flow.updated_at = now;
    Ok(())
}
