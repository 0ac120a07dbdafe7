//! Flow-level read and trigger operations for the Tracker.

use log::{info, warn};

use super::Tracker;
use crate::{
    display::{FlowSummaries, Playbooks},
    engine::{resolver, FlowProgress, Resolution},
    error::{FlowError, Result},
    models::{DashboardSummary, Flow, FlowSummary, Playbook},
    params::{Dashboard, FlowLookup, ListFlows, ShowFlow, TriggerFlow},
};

impl Tracker {
    /// Validates a playbook and stores it, replacing any playbook with the
    /// same name.
    pub async fn import_playbook(&self, playbook: &Playbook) -> Result<Playbook> {
        playbook.validate()?;
        let stored = self.backend.import_playbook(playbook).await?;
        info!(
            "Imported playbook '{}' with {} step(s)",
            stored.name,
            stored.step_count()
        );
        Ok(stored)
    }

    pub async fn get_playbook(&self, name: &str) -> Result<Option<Playbook>> {
        self.backend.get_playbook(name).await
    }

    pub async fn list_playbooks(&self) -> Result<Playbooks> {
        Ok(Playbooks(self.backend.list_playbooks().await?))
    }

    /// Instantiates a playbook against an incident.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidInput` for a blank playbook or incident,
    /// `FlowError::PlaybookNotFound` for an unknown playbook and
    /// `FlowError::InvalidInput` when the incident already has a flow in
    /// flight.
    pub async fn trigger_flow(&self, params: &TriggerFlow) -> Result<Flow> {
        if params.playbook.trim().is_empty() {
            return Err(FlowError::invalid_input("playbook")
                .with_reason("Playbook name cannot be empty"));
        }
        if params.incident_id.trim().is_empty() {
            return Err(FlowError::invalid_input("incident_id")
                .with_reason("Incident ID cannot be empty"));
        }

        let flow = self.backend.create_flow(params).await?;
        info!(
            "Triggered flow {} from '{}' for incident {}",
            flow.id, flow.playbook, flow.incident_id
        );
        Ok(flow)
    }

    pub async fn get_flow(&self, id: u64) -> Result<Option<Flow>> {
        self.backend.get_flow(id).await
    }

    /// Like [`get_flow`](Self::get_flow) but a missing flow is an error.
    pub async fn fetch_flow(&self, id: u64) -> Result<Flow> {
        self.backend
            .get_flow(id)
            .await?
            .ok_or(FlowError::FlowNotFound { id })
    }

    /// Looks a flow up by ID or by incident.
    pub async fn show_flow(&self, params: &ShowFlow) -> Result<Option<Flow>> {
        match params.lookup()? {
            FlowLookup::ById(id) => self.backend.get_flow(id).await,
            FlowLookup::ByIncident(incident_id) => {
                self.backend.get_flow_by_incident(&incident_id).await
            }
        }
    }

    pub async fn list_flows(&self, params: &ListFlows) -> Result<FlowSummaries> {
        let filter = params.to_filter()?;
        let flows = self.backend.list_flows(&filter).await?;
        Ok(FlowSummaries(flows.iter().map(FlowSummary::from).collect()))
    }

    /// In-flight flows of an analyst (everyone when unset), with stuck flows
    /// logged.
    pub async fn dashboard(&self, params: &Dashboard) -> Result<DashboardSummary> {
        let summary = self.backend.dashboard(params.analyst.as_deref()).await?;
        for stuck in summary.stuck_flows() {
            warn!(
                "Flow {} for incident {} cannot make progress",
                stuck.id, stuck.incident_id
            );
        }
        Ok(summary)
    }

    /// Where the flow stands: the step underway, the next eligible step,
    /// completion, or a deadlock.
    pub async fn next_step(&self, flow_id: u64) -> Result<Resolution> {
        let flow = self.fetch_flow(flow_id).await?;
        let resolution = resolver::resolve(&flow.all_steps());
        if let Resolution::Deadlocked { ref blocked } = resolution {
            warn!(
                "Flow {flow_id} is deadlocked; blocked steps: {}",
                blocked.join(", ")
            );
        }
        Ok(resolution)
    }

    pub async fn progress(&self, flow_id: u64) -> Result<FlowProgress> {
        let flow = self.fetch_flow(flow_id).await?;
        Ok(FlowProgress::of(&flow))
    }
}
