//! Mutating operations for the Tracker.
//!
//! Each request is checked against a fresh snapshot first so that invalid
//! transitions fail fast with a precise error, even when the backend is
//! remote. The backend still applies the same rules and has the final word;
//! its returned snapshot is what callers get back.

use log::{debug, info, warn};

use super::Tracker;
use crate::{
    engine::machine,
    error::{FlowError, Result},
    models::{Flow, FlowStatus, StepStatus},
    params::{ApplyStepAction, CommitFlow, ControlFlow},
    poll::{poll_until, PollPolicy},
};

impl Tracker {
    /// Applies an action to one step and returns the updated flow.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::FlowNotFound`, `FlowError::StepNotFound` or any of
    /// the state machine errors (`InvalidTransition`, `RequiredStep`,
    /// `DependencyNotSatisfied`, `FlowNotActive`).
    pub async fn apply_step_action(&self, params: &ApplyStepAction) -> Result<Flow> {
        let snapshot = self.fetch_flow(params.flow_id).await?;
        machine::check_step_action(&snapshot, &params.step, &params.action)?;

        let flow = self
            .backend
            .apply_step_action(params.flow_id, &params.step, &params.action)
            .await?;
        info!(
            "Applied '{}' to step '{}' of flow {}",
            params.action.name(),
            params.step,
            flow.id
        );
        Ok(flow)
    }

    /// Pauses, resumes or cancels a flow.
    pub async fn control_flow(&self, params: &ControlFlow) -> Result<Flow> {
        let snapshot = self.fetch_flow(params.flow_id).await?;
        machine::check_control(&snapshot, &params.control)?;

        let flow = self
            .backend
            .control_flow(params.flow_id, &params.control)
            .await?;
        info!(
            "Flow {} is now {} ({})",
            flow.id,
            flow.status,
            params.control.reason()
        );
        Ok(flow)
    }

    /// Commits a finished flow and closes its incident.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::FlowIncomplete` while steps can still run and
    /// `FlowError::DeadlockDetected` when unfinished steps can never run.
    pub async fn commit_flow(&self, params: &CommitFlow) -> Result<Flow> {
        let snapshot = self.fetch_flow(params.flow_id).await?;
        if let Err(e) = machine::check_commit(&snapshot, &params.commit) {
            if matches!(e, FlowError::DeadlockDetected { .. }) {
                warn!("{e}");
            }
            return Err(e);
        }

        let flow = self
            .backend
            .commit_flow(params.flow_id, &params.commit)
            .await?;
        info!(
            "Committed flow {}; incident {} is {}",
            flow.id,
            flow.incident_id,
            params.commit.incident_status
        );
        Ok(flow)
    }

    /// Polls until the flow reaches `status`, using the tracker's policy.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Timeout` when the policy runs out of attempts.
    pub async fn wait_for_status(&self, flow_id: u64, status: FlowStatus) -> Result<Flow> {
        self.wait_for_status_with(flow_id, status, self.poll).await
    }

    pub async fn wait_for_status_with(
        &self,
        flow_id: u64,
        status: FlowStatus,
        policy: PollPolicy,
    ) -> Result<Flow> {
        let operation = format!("flow {flow_id} to become {status}");
        poll_until(&operation, policy, || async move {
            let flow = self.fetch_flow(flow_id).await?;
            debug!("Flow {flow_id} is {}", flow.status);
            Ok((flow.status == status).then_some(flow))
        })
        .await
    }

    /// Polls until a step reaches `status`, typically an automated step
    /// driven by the remote console.
    pub async fn wait_for_step(
        &self,
        flow_id: u64,
        step: &str,
        status: StepStatus,
    ) -> Result<Flow> {
        let operation = format!("step '{step}' of flow {flow_id} to become {status}");
        poll_until(&operation, self.poll, || async move {
            let flow = self.fetch_flow(flow_id).await?;
            let current = flow
                .step(step)
                .ok_or_else(|| FlowError::StepNotFound {
                    flow_id,
                    name: step.to_string(),
                })?
                .status;
            Ok((current == status).then_some(flow))
        })
        .await
    }
}
