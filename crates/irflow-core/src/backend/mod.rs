//! Authoritative storage for flows.
//!
//! The tracker never mutates flow state itself; it asks a [`FlowBackend`]
//! and works from the snapshot the backend returns. Two implementations
//! exist:
//!
//! - [`LocalBackend`]: SQLite on disk, for stand-alone use
//! - [`RemoteBackend`]: the console's REST API over HTTP

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{
        DashboardSummary, Flow, FlowCommit, FlowControl, FlowFilter, Playbook, StepAction,
    },
    params::TriggerFlow,
};

pub mod local;
pub mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

/// Operations every flow store provides. Mutating calls return the
/// backend's view of the flow after the change.
#[async_trait]
pub trait FlowBackend: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Validates and stores a playbook, replacing one with the same name.
    async fn import_playbook(&self, playbook: &Playbook) -> Result<Playbook>;

    async fn get_playbook(&self, name: &str) -> Result<Option<Playbook>>;

    async fn list_playbooks(&self) -> Result<Vec<Playbook>>;

    /// Instantiates a playbook against an incident.
    async fn create_flow(&self, request: &TriggerFlow) -> Result<Flow>;

    async fn get_flow(&self, id: u64) -> Result<Option<Flow>>;

    /// The incident's in-flight flow, or its most recent one.
    async fn get_flow_by_incident(&self, incident_id: &str) -> Result<Option<Flow>>;

    async fn list_flows(&self, filter: &FlowFilter) -> Result<Vec<Flow>>;

    async fn apply_step_action(
        &self,
        flow_id: u64,
        step: &str,
        action: &StepAction,
    ) -> Result<Flow>;

    async fn control_flow(&self, flow_id: u64, control: &FlowControl) -> Result<Flow>;

    async fn commit_flow(&self, flow_id: u64, commit: &FlowCommit) -> Result<Flow>;

    /// In-flight flows of one analyst; every analyst when `None`.
    async fn dashboard(&self, analyst: Option<&str>) -> Result<DashboardSummary>;
}
